//! `merge` and `check` commands.

use super::helpers::{ci_policy, emit, github, load_event, open_git, stamper};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::git::VersionControl;
use crate::guardrails::GuardrailReport;
use crate::tagging::GitTagBackend;
use crate::workflow::{ReleaseOutcome, ReleaseWorkflow};
use std::path::PathBuf;

/// Execute merge command
pub(super) async fn execute_merge(event: Option<&PathBuf>, config: &RuntimeConfig) -> Result<i32> {
    let event = load_event(event, config)?;
    config.section(&format!("Release: {} → {}", event.source_branch, event.target_branch));

    let git = open_git(config)?;
    let host = github(config)?;
    let tagger = GitTagBackend::new(&git);
    let stamper = stamper(config);

    if let Err(e) = git.fetch_tags().await {
        log::warn!("could not fetch tags, numbering from local tags: {e}");
    }

    let workflow = ReleaseWorkflow::new(
        &git,
        &host,
        &tagger,
        &stamper,
        &config.flow,
        config.env.freeze(),
        ci_policy(config),
    );
    let outcome = workflow.run_merge(&event).await?;

    print_outcome(config, &outcome);
    emit(config, &outcome)?;
    Ok(0)
}

/// Execute check command; exit code 1 when a guardrail fails
pub(super) async fn execute_check(event: Option<&PathBuf>, config: &RuntimeConfig) -> Result<i32> {
    let event = load_event(event, config)?;
    config.section(&format!("Check: {} → {}", event.source_branch, event.target_branch));

    let git = open_git(config)?;
    let host = github(config)?;
    let tagger = GitTagBackend::new(&git);
    let stamper = stamper(config);

    let workflow = ReleaseWorkflow::new(
        &git,
        &host,
        &tagger,
        &stamper,
        &config.flow,
        config.env.freeze(),
        ci_policy(config),
    );
    let outcome = workflow.check_outcome(&event).await?;

    config.println(&format!("Phase: {} ({})", outcome.phase, outcome.version));
    print_report(config, &outcome.guardrails);
    emit(config, &outcome)?;

    Ok(if outcome.guardrails.passed { 0 } else { 1 })
}

fn print_report(config: &RuntimeConfig, report: &GuardrailReport) {
    for result in &report.details {
        let line = format!("{} {}: {}", result.id, result.name, result.message);
        if result.skipped {
            config.indent(&format!("- {line}"));
        } else if result.passed {
            config.success_println(&line);
        } else {
            config.error_println(&line);
        }
    }
}

fn print_outcome(config: &RuntimeConfig, outcome: &ReleaseOutcome) {
    let validated: Vec<String> = outcome.guardrails_validated.iter().map(|id| id.to_string()).collect();
    config.success_println(&format!("{} phase complete for {}", outcome.phase, outcome.version));
    config.indent(&format!("Guardrails passed: {}", validated.join(", ")));
    if let Some(url) = &outcome.release_url {
        config.indent(&format!("Release: {url}"));
    }
    if !outcome.tags_created.is_empty() {
        config.indent(&format!("Tags: {}", outcome.tags_created.join(", ")));
    }
    for pr in &outcome.backflow_prs {
        config.indent(&format!("Backflow into {}: {}", pr.branch, pr.url));
    }
}
