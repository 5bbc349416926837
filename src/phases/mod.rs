//! Phase executors: the side effects of an alpha, beta, freeze or stable merge.
//!
//! Every external call is awaited before the next one starts. The executors
//! assume the guardrails already passed for the context they are given.

mod backflow;
mod prerelease;
mod stable;

pub use backflow::{BackflowPr, BackflowSync};

use crate::branch::ReleaseVersion;
use crate::config::FlowConfig;
use crate::context::{Phase, ReleaseContext};
use crate::error::Result;
use crate::git::{CommitInfo, VersionControl};
use crate::github::ReleaseHost;
use crate::tagging::{PrereleaseKind, TagBackend};
use crate::version::VersionStamper;
use serde::Serialize;

/// Marker that keeps stamping commits from re-triggering CI
pub const SKIP_CI: &str = "[skip ci]";

/// Result of an alpha or beta release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrereleaseOutcome {
    /// Prerelease record URL
    pub release_url: String,
    /// Tags pointing at the prerelease
    pub tags_created: Vec<String>,
}

/// Result of a stable release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StableOutcome {
    /// Published release URL
    pub release_url: String,
    /// Version tag followed by the smart tags
    pub tags_created: Vec<String>,
    /// Backflow pull requests opened
    pub backflow_prs: Vec<BackflowPr>,
}

/// What a phase did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Alpha prerelease
    Alpha(PrereleaseOutcome),
    /// Beta prerelease
    Beta(PrereleaseOutcome),
    /// Dev merged into release; nothing to do
    Freeze,
    /// Stable release
    Stable(StableOutcome),
}

impl PhaseOutcome {
    /// Phase this outcome belongs to
    pub fn phase(&self) -> Phase {
        match self {
            PhaseOutcome::Alpha(_) => Phase::Alpha,
            PhaseOutcome::Beta(_) => Phase::Beta,
            PhaseOutcome::Freeze => Phase::Freeze,
            PhaseOutcome::Stable(_) => Phase::Stable,
        }
    }
}

/// Runs the phase of a resolved context against the collaborators
#[derive(Debug)]
pub struct PhaseExecutor<'a, V, H, T> {
    git: &'a V,
    host: &'a H,
    tagger: &'a T,
    stamper: &'a VersionStamper,
    config: &'a FlowConfig,
}

impl<'a, V, H, T> PhaseExecutor<'a, V, H, T>
where
    V: VersionControl,
    H: ReleaseHost,
    T: TagBackend,
{
    /// Create an executor
    pub fn new(
        git: &'a V,
        host: &'a H,
        tagger: &'a T,
        stamper: &'a VersionStamper,
        config: &'a FlowConfig,
    ) -> Self {
        Self {
            git,
            host,
            tagger,
            stamper,
            config,
        }
    }

    /// Dispatch on the context's phase
    pub async fn execute(&self, context: &ReleaseContext) -> Result<PhaseOutcome> {
        match context.phase {
            Phase::Alpha => self
                .run_prerelease(context, PrereleaseKind::Alpha)
                .await
                .map(PhaseOutcome::Alpha),
            Phase::Beta => self
                .run_prerelease(context, PrereleaseKind::Beta)
                .await
                .map(PhaseOutcome::Beta),
            Phase::Freeze => {
                log::info!(
                    "{} merged into {}: stabilization of {} begins, nothing to publish",
                    context.source_branch,
                    context.target_branch,
                    context.version
                );
                Ok(PhaseOutcome::Freeze)
            }
            Phase::Stable => self.run_stable(context).await.map(PhaseOutcome::Stable),
        }
    }

    /// Stamp project files, commit them with [`SKIP_CI`] and push to `branch`
    async fn stamp_and_push(
        &self,
        version: &ReleaseVersion,
        label: Option<&str>,
        branch: &str,
    ) -> Result<Option<CommitInfo>> {
        let results = self.stamper.stamp_all(&version.bare(), label)?;
        let written = results.iter().filter(|r| r.updated).count();
        log::info!("stamped {written} of {} version file(s)", results.len());

        self.git
            .configure_identity(&self.config.commit_name, &self.config.commit_email)
            .await?;

        let stamped = crate::version::compose_version(&version.bare(), label);
        let message = format!("chore(release): v{stamped} {SKIP_CI}");
        let commit = self.git.commit_paths(&self.stamper.paths(), &message).await?;

        match &commit {
            Some(commit) => {
                self.git.push_head_to(branch).await?;
                log::info!("pushed {} to {branch}", commit.short_hash());
            }
            None => log::info!("version files already at v{stamped}, nothing to push"),
        }
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MergeEvent;
    use crate::fakes::{FakeGit, FakeHost, FakeTagger};
    use tempfile::TempDir;

    #[tokio::test]
    async fn freeze_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let (git, host, tagger) = (FakeGit::default(), FakeHost::default(), FakeTagger::default());
        let stamper = VersionStamper::new(dir.path(), Vec::new());
        let config = FlowConfig::default();
        let executor = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config);

        let event = MergeEvent::new("dev/v1.2.0", "release/v1.2.0").with_repository("acme/app");
        let context = ReleaseContext::from_event(&event, None).unwrap();

        assert_eq!(executor.execute(&context).await.unwrap(), PhaseOutcome::Freeze);
        assert!(git.calls().is_empty());
        assert!(host.calls().is_empty());
        assert!(tagger.created().is_empty());
    }
}
