//! Command execution.
//!
//! Each subcommand has its own executor; [`execute_command`] validates the
//! arguments, builds the [`RuntimeConfig`] and turns errors into exit codes.

mod helpers;
mod merge;
mod prerelease;
mod stamp;
mod train;

use crate::cli::{Args, Command, OutputManager, RuntimeConfig};
use crate::config::EnvConfig;
use crate::error::{ReleaseError, Result};

use merge::{execute_check, execute_merge};
use prerelease::execute_next_prerelease;
use stamp::execute_stamp;
use train::execute_start_train;

/// Execute the parsed command against an environment snapshot
pub async fn execute_command(args: Args, env: EnvConfig) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        OutputManager::new(false).error(&format!("Invalid arguments: {validation_error}"));
        return Ok(2);
    }

    let config = match RuntimeConfig::new(&args, env) {
        Ok(config) => config,
        Err(e) => {
            report_failure(&OutputManager::new(false), args.command.name(), &e);
            return Ok(1);
        }
    };

    let result = match &args.command {
        Command::Merge { event } => execute_merge(event.as_ref(), &config).await,
        Command::Check { event } => execute_check(event.as_ref(), &config).await,
        Command::StartTrain { version, base } => {
            execute_start_train(version, base.as_deref(), &config).await
        }
        Command::NextPrerelease { version, kind } => {
            execute_next_prerelease(version, (*kind).into(), &config).await
        }
        Command::Stamp { version, pre } => execute_stamp(version, pre.as_deref(), &config),
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => {
            report_failure(config.output(), args.command.name(), &e);
            Ok(1)
        }
    }
}

fn report_failure(output: &OutputManager, command: &str, error: &ReleaseError) {
    log::debug!("command '{command}' failed: {error:?}");
    output.error(&format!("Command '{command}' failed: {error}"));

    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        eprintln!("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            eprintln!("  • {suggestion}");
        }
    }
    if error.is_recoverable() {
        eprintln!("  • This failure looks transient; re-running the job may succeed.");
    }
}
