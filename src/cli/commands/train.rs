//! `start-train` command.

use super::helpers::{emit, github, open_git, repository};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::train::TrainInitiator;

/// Execute start-train command
pub(super) async fn execute_start_train(version: &str, base: Option<&str>, config: &RuntimeConfig) -> Result<i32> {
    let repository = repository(config)?;
    config.section(&format!("Start release train {version}"));

    let git = open_git(config)?;
    let host = github(config)?;
    let outcome = TrainInitiator::new(&git, &host, &repository, &config.flow.main_branch)
        .start(version, base)
        .await?;

    config.success_println(&format!("Created {} at {}", outcome.dev_branch, outcome.base_commit));
    config.indent(&format!("Release intent: {}", outcome.intent_url));
    emit(config, &outcome)?;
    Ok(0)
}
