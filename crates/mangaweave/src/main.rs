//! mangaweave CLI binary.
//!
//! - Run one pipeline stage, or the whole main sequence
//! - Export the JSON shape descriptors the stages validate against

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_stage, write_schemas};

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    mangaweave::init_tracing(cli.verbose, cli.log_format())
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    match cli.command {
        Commands::Run {
            stage,
            branch_id,
            timeline,
            config,
        } => {
            run_stage(&stage, branch_id, timeline, config.as_deref()).await?;
        }

        Commands::Schemas { out, config } => {
            write_schemas(&out, config.as_deref()).await?;
        }
    }

    Ok(())
}
