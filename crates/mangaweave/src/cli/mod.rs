//! Command-line interface module.

mod commands;
mod run;
mod schemas;

pub use commands::{Cli, Commands};
pub use run::run_stage;
pub use schemas::write_schemas;
