//! Shared helper functions for command execution.

use crate::cli::RuntimeConfig;
use crate::cli::write_github_output;
use crate::config::CiPolicy;
use crate::context::MergeEvent;
use crate::error::{ContextError, Result};
use crate::git::SystemGit;
use crate::github::{GitHubClient, GitHubConfig};
use crate::version::VersionStamper;
use serde::Serialize;
use std::path::PathBuf;

/// Repository identity from `--repo` or `GITHUB_REPOSITORY`
pub(super) fn repository(config: &RuntimeConfig) -> Result<String> {
    config.repository.clone().ok_or_else(|| {
        ContextError::RepositoryMissing {
            reason: "pass --repo owner/name or set GITHUB_REPOSITORY".to_string(),
        }
        .into()
    })
}

/// Read the merge event from `--event` or `GITHUB_EVENT_PATH`
pub(super) fn load_event(event: Option<&PathBuf>, config: &RuntimeConfig) -> Result<MergeEvent> {
    let path = event
        .cloned()
        .or_else(|| config.env.event_path.clone())
        .ok_or_else(|| ContextError::EventSourceNotFound {
            path: PathBuf::from("$GITHUB_EVENT_PATH"),
            reason: "no --event given and GITHUB_EVENT_PATH is unset".to_string(),
        })?;
    MergeEvent::load(&path, config.repository.as_deref())
}

/// Version control handle for the working directory
pub(super) fn open_git(config: &RuntimeConfig) -> Result<SystemGit> {
    SystemGit::open(&config.workdir, &config.flow.remote, config.flow.git_timeout())
}

/// GitHub client from the token and API URL in the environment
pub(super) fn github(config: &RuntimeConfig) -> Result<GitHubClient> {
    let mut github = GitHubConfig {
        token: config.env.token.clone(),
        timeout: config.flow.http_timeout(),
        ..Default::default()
    };
    if let Some(api_url) = &config.env.api_url {
        github.api_url = api_url.clone();
    }
    GitHubClient::new(github)
}

/// Stamper for the configured project files
pub(super) fn stamper(config: &RuntimeConfig) -> VersionStamper {
    VersionStamper::new(&config.workdir, config.flow.stamp.clone())
}

/// CI self-check policy from `GITHUB_JOB` and the config file
pub(super) fn ci_policy(config: &RuntimeConfig) -> CiPolicy {
    CiPolicy::new(config.env.job_name.clone(), &config.flow.self_check_names)
}

/// Print the record as JSON when requested and export it to `$GITHUB_OUTPUT`
pub(super) fn emit<T: Serialize>(config: &RuntimeConfig, record: &T) -> Result<()> {
    if config.json {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    if let Some(path) = &config.env.output_path {
        write_github_output(path, record)?;
    }
    Ok(())
}
