//! CLI command definitions.

use mangaweave::LogFormat;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// mangaweave - turn manga pages into summaries, a novel and branching timelines
#[derive(Parser, Debug)]
#[command(name = "mangaweave")]
#[command(about = "Resumable manga to narrative pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

impl Cli {
    /// Log format selected by the flags.
    pub fn log_format(&self) -> LogFormat {
        if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline stage (or `all`)
    Run {
        /// Stage name: chapters, describe, refine, novel, story_index, anchors,
        /// branches, branch_generate, characters, scales, continue or all
        #[arg(long)]
        stage: String,

        /// Branch to extend (branch_generate)
        #[arg(long)]
        branch_id: Option<String>,

        /// Summary namespace to continue instead of the main line (continue)
        #[arg(long)]
        timeline: Option<String>,

        /// Extra configuration file layered over the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the JSON descriptor of every output shape
    Schemas {
        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Extra configuration file (scale bounds shape the descriptors)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_branch() {
        let cli = Cli::try_parse_from([
            "mangaweave",
            "run",
            "--stage",
            "branch_generate",
            "--branch-id",
            "ch_002_a01_b01",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format(), LogFormat::Pretty);
        match cli.command {
            Commands::Run {
                stage,
                branch_id,
                timeline,
                config,
            } => {
                assert_eq!(stage, "branch_generate");
                assert_eq!(branch_id.as_deref(), Some("ch_002_a01_b01"));
                assert!(timeline.is_none());
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_schemas() {
        let cli =
            Cli::try_parse_from(["mangaweave", "--json-logs", "schemas", "--out", "schemas"]).unwrap();
        assert_eq!(cli.log_format(), LogFormat::Json);
        assert!(matches!(cli.command, Commands::Schemas { .. }));
    }

    #[test]
    fn test_run_requires_stage() {
        assert!(Cli::try_parse_from(["mangaweave", "run"]).is_err());
    }
}
