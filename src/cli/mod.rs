//! Command line interface for release_flow.
//!
//! Argument parsing lives in `args`, colored output and step-output export in
//! `output`, and one executor per subcommand in [`commands`].

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, KindArg, RuntimeConfig};
pub use commands::execute_command;
pub use output::{OutputManager, output_lines, write_github_output};

use crate::config::EnvConfig;
use crate::error::Result;

/// Main CLI entry point
pub async fn run(env: EnvConfig) -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args, env).await
}
