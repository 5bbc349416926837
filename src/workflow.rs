//! The merge workflow: resolve, guard, execute, report.

use crate::branch::ReleaseVersion;
use crate::config::{CiPolicy, FlowConfig, FreezeConfig};
use crate::context::{ContextResolver, MergeEvent, Phase, ReleaseContext};
use crate::error::Result;
use crate::git::VersionControl;
use crate::github::ReleaseHost;
use crate::guardrails::{GuardrailEngine, GuardrailId, GuardrailReport};
use crate::phases::{BackflowPr, PhaseExecutor, PhaseOutcome};
use crate::tagging::TagBackend;
use crate::version::VersionStamper;
use serde::Serialize;

/// Flat result of a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOutcome {
    /// Executed phase
    pub phase: Phase,
    /// Release version, `vX.Y.Z`
    pub version: ReleaseVersion,
    /// Release record URL; `None` for freeze
    pub release_url: Option<String>,
    /// Tags created or moved
    pub tags_created: Vec<String>,
    /// Backflow pull requests opened (stable only)
    #[serde(rename = "backflowPRs")]
    pub backflow_prs: Vec<BackflowPr>,
    /// Guardrails that ran and passed
    pub guardrails_validated: Vec<GuardrailId>,
    /// Head branch
    pub source_branch: String,
    /// Base branch
    pub target_branch: String,
}

impl ReleaseOutcome {
    /// Flatten a phase outcome
    pub fn new(context: &ReleaseContext, report: &GuardrailReport, outcome: PhaseOutcome) -> Self {
        let phase = outcome.phase();
        let (release_url, tags_created, backflow_prs) = match outcome {
            PhaseOutcome::Alpha(o) | PhaseOutcome::Beta(o) => (Some(o.release_url), o.tags_created, Vec::new()),
            PhaseOutcome::Freeze => (None, Vec::new(), Vec::new()),
            PhaseOutcome::Stable(o) => (Some(o.release_url), o.tags_created, o.backflow_prs),
        };
        Self {
            phase,
            version: context.version.clone(),
            release_url,
            tags_created,
            backflow_prs,
            guardrails_validated: report.validated.clone(),
            source_branch: context.source_branch.clone(),
            target_branch: context.target_branch.clone(),
        }
    }
}

/// Result of a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    /// Phase the merge would run
    pub phase: Phase,
    /// Release version
    pub version: ReleaseVersion,
    /// Whether a draft intent exists
    pub intent_url: Option<String>,
    /// Guardrail evaluation
    pub guardrails: GuardrailReport,
}

/// Wires the resolver, guardrail engine and phase executors together
#[derive(Debug)]
pub struct ReleaseWorkflow<'a, V, H, T> {
    git: &'a V,
    host: &'a H,
    tagger: &'a T,
    stamper: &'a VersionStamper,
    config: &'a FlowConfig,
    freeze: FreezeConfig,
    ci: CiPolicy,
}

impl<'a, V, H, T> ReleaseWorkflow<'a, V, H, T>
where
    V: VersionControl,
    H: ReleaseHost,
    T: TagBackend,
{
    /// Create a workflow
    pub fn new(
        git: &'a V,
        host: &'a H,
        tagger: &'a T,
        stamper: &'a VersionStamper,
        config: &'a FlowConfig,
        freeze: FreezeConfig,
        ci: CiPolicy,
    ) -> Self {
        Self {
            git,
            host,
            tagger,
            stamper,
            config,
            freeze,
            ci,
        }
    }

    /// Resolve the context and evaluate guardrails without side effects
    pub async fn check(&self, event: &MergeEvent) -> Result<(ReleaseContext, GuardrailReport)> {
        let context = ContextResolver::new(self.host).resolve(event).await?;
        let report = GuardrailEngine::new(self.host, self.freeze, self.ci.clone())
            .evaluate(&context)
            .await;
        Ok((context, report))
    }

    /// Dry run summary
    pub async fn check_outcome(&self, event: &MergeEvent) -> Result<CheckOutcome> {
        let (context, guardrails) = self.check(event).await?;
        Ok(CheckOutcome {
            phase: context.phase,
            version: context.version,
            intent_url: context.intent.map(|i| i.url),
            guardrails,
        })
    }

    /// Run the full merge flow; a failing guardrail stops it before any side effect
    pub async fn run_merge(&self, event: &MergeEvent) -> Result<ReleaseOutcome> {
        let (context, report) = self.check(event).await?;
        let report = report.into_result()?;

        let outcome = PhaseExecutor::new(self.git, self.host, self.tagger, self.stamper, self.config)
            .execute(&context)
            .await?;
        log::info!("{} phase for {} complete", context.phase, context.version);

        Ok(ReleaseOutcome::new(&context, &report, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGit, FakeHost, FakeTagger};
    use tempfile::TempDir;

    #[tokio::test]
    async fn serializes_with_documented_keys() {
        let dir = TempDir::new().unwrap();
        let stamper = VersionStamper::new(dir.path(), Vec::new());
        let config = FlowConfig::default();
        let git = FakeGit::default();
        let host = FakeHost::default().with_draft(1, "v1.2.0", "dev/v1.2.0", "u");
        let tagger = FakeTagger::default();
        let workflow = ReleaseWorkflow::new(
            &git,
            &host,
            &tagger,
            &stamper,
            &config,
            FreezeConfig::default(),
            CiPolicy::default(),
        );

        let event = MergeEvent::new("dev/v1.2.0", "release/v1.2.0").with_repository("acme/app");
        let outcome = workflow.run_merge(&event).await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["phase"], "freeze");
        assert_eq!(json["version"], "v1.2.0");
        assert!(json["releaseUrl"].is_null());
        assert_eq!(json["backflowPRs"], serde_json::json!([]));
        assert_eq!(json["guardrailsValidated"], serde_json::json!(["G5"]));
        assert_eq!(json["sourceBranch"], "dev/v1.2.0");
        assert_eq!(json["targetBranch"], "release/v1.2.0");
    }
}
