//! Release context resolution.

use super::MergeEvent;
use crate::branch::{BranchKind, ReleaseVersion, classify};
use crate::error::{ContextError, Result};
use crate::github::{DraftIntent, ReleaseHost};
use serde::Serialize;
use std::fmt;

/// Release phase a merge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Work merged into `dev/vX.Y.Z`
    Alpha,
    /// Fixes merged into `release/vX.Y.Z`
    Beta,
    /// `dev/vX.Y.Z` merged into `release/vX.Y.Z`
    Freeze,
    /// Merge into the main branch
    Stable,
}

impl Phase {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Alpha => "alpha",
            Phase::Beta => "beta",
            Phase::Freeze => "freeze",
            Phase::Stable => "stable",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a merge, decided by the target branch first
pub fn infer_phase(source: &BranchKind, target: &BranchKind) -> Option<Phase> {
    match (target, source) {
        (BranchKind::Dev(_), _) => Some(Phase::Alpha),
        (BranchKind::Release(_), BranchKind::Dev(_)) => Some(Phase::Freeze),
        (BranchKind::Release(_), _) => Some(Phase::Beta),
        (BranchKind::Main, _) => Some(Phase::Stable),
        _ => None,
    }
}

/// First version found in the target branch, then in the source branch
pub fn extract_version(source_branch: &str, target_branch: &str) -> Option<ReleaseVersion> {
    ReleaseVersion::find_in(target_branch).or_else(|| ReleaseVersion::find_in(source_branch))
}

/// Everything a guardrail or phase executor needs to know about a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    /// Derived phase
    pub phase: Phase,
    /// Normalized version
    pub version: ReleaseVersion,
    /// Head branch
    pub source_branch: String,
    /// Base branch
    pub target_branch: String,
    /// Classified head branch
    pub source_kind: BranchKind,
    /// Classified base branch
    pub target_kind: BranchKind,
    /// Unpublished release declaring this version, if any
    pub intent: Option<DraftIntent>,
    /// `owner/name`
    pub repository: String,
    /// Merged pull request number
    pub pull_request: Option<u64>,
}

impl ReleaseContext {
    /// Build a context from an event plus an already looked-up intent
    pub fn from_event(event: &MergeEvent, intent: Option<DraftIntent>) -> Result<Self> {
        let source_kind = classify(&event.source_branch);
        let target_kind = classify(&event.target_branch);

        let phase = infer_phase(&source_kind, &target_kind).ok_or_else(|| ContextError::PhaseUndetermined {
            source_branch: event.source_branch.clone(),
            target_branch: event.target_branch.clone(),
        })?;

        let version = extract_version(&event.source_branch, &event.target_branch).ok_or_else(|| {
            ContextError::VersionNotFound {
                source_branch: event.source_branch.clone(),
                target_branch: event.target_branch.clone(),
            }
        })?;

        let repository = event
            .repository
            .clone()
            .ok_or_else(|| ContextError::RepositoryMissing {
                reason: "the event has no repository and GITHUB_REPOSITORY is unset".to_string(),
            })?;

        Ok(Self {
            phase,
            version,
            source_branch: event.source_branch.clone(),
            target_branch: event.target_branch.clone(),
            source_kind,
            target_kind,
            intent,
            repository,
            pull_request: event.pull_request,
        })
    }
}

/// Find the unpublished release whose tag equals the version
pub fn find_intent<'a>(
    releases: impl IntoIterator<Item = &'a crate::github::Release>,
    version: &ReleaseVersion,
) -> Option<DraftIntent> {
    let tag = version.tag();
    releases
        .into_iter()
        .filter(|r| r.tag_name == tag)
        .find_map(DraftIntent::from_release)
}

/// Resolves merge events into [`ReleaseContext`]s using a release host
#[derive(Debug)]
pub struct ContextResolver<'a, H> {
    host: &'a H,
}

impl<'a, H: ReleaseHost> ContextResolver<'a, H> {
    /// Create a resolver
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Resolve an event; branch problems are reported before any API call
    pub async fn resolve(&self, event: &MergeEvent) -> Result<ReleaseContext> {
        let mut context = ReleaseContext::from_event(event, None)?;

        let releases = self.host.list_releases(&context.repository).await?;
        context.intent = find_intent(&releases, &context.version);

        match &context.intent {
            Some(intent) => log::info!("draft intent for {} found: {}", context.version, intent.url),
            None => log::info!("no draft intent for {}", context.version),
        }
        log::info!(
            "{} -> {}: {} phase for {}",
            context.source_branch,
            context.target_branch,
            context.phase,
            context.version
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeHost;

    fn phase_of(source: &str, target: &str) -> Option<Phase> {
        infer_phase(&classify(source), &classify(target))
    }

    #[test]
    fn phase_follows_target_then_source() {
        assert_eq!(phase_of("feature/x", "dev/v1.2.0"), Some(Phase::Alpha));
        assert_eq!(phase_of("release/v1.2.0", "dev/v1.2.0"), Some(Phase::Alpha));
        assert_eq!(phase_of("dev/v1.2.0", "release/v1.2.0"), Some(Phase::Freeze));
        assert_eq!(phase_of("fix/y", "release/v1.2.0"), Some(Phase::Beta));
        assert_eq!(phase_of("feature/x", "release/v1.2.0"), Some(Phase::Beta));
        assert_eq!(phase_of("release/v1.2.0", "main"), Some(Phase::Stable));
        assert_eq!(phase_of("release/v1.2.0", "master"), Some(Phase::Stable));
        assert_eq!(phase_of("feature/x", "develop"), None);
        assert_eq!(phase_of("feature/x", "dev/1.2.0"), None);
    }

    #[test]
    fn version_prefers_target_branch() {
        assert_eq!(
            extract_version("dev/v1.3.0", "release/v1.2.0"),
            Some(ReleaseVersion::new(1, 2, 0))
        );
        assert_eq!(extract_version("release/v2.0.1", "main"), Some(ReleaseVersion::new(2, 0, 1)));
        assert_eq!(extract_version("hotfix/urgent", "main"), None);
    }

    #[test]
    fn stable_merge_without_version_fails() {
        let event = MergeEvent::new("hotfix/urgent", "main").with_repository("acme/app");
        let err = ReleaseContext::from_event(&event, None).unwrap_err();
        assert!(err.to_string().contains("Cannot determine release version"));
    }

    #[test]
    fn unknown_target_is_phase_undetermined() {
        let event = MergeEvent::new("feature/x", "develop").with_repository("acme/app");
        let err = ReleaseContext::from_event(&event, None).unwrap_err();
        assert!(err.to_string().contains("Cannot determine release phase"));
    }

    #[test]
    fn missing_repository_is_reported() {
        let event = MergeEvent::new("feature/x", "dev/v1.0.0");
        let err = ReleaseContext::from_event(&event, None).unwrap_err();
        assert!(err.to_string().contains("Repository context missing"));
    }

    #[tokio::test]
    async fn resolves_unpublished_intent_for_the_version() {
        let host = FakeHost::default()
            .with_published("v1.1.0", "main")
            .with_draft(7, "v1.2.0", "dev/v1.2.0", "https://example.test/draft/7");
        let event = MergeEvent::new("feature/x", "dev/v1.2.0").with_repository("acme/app");

        let context = ContextResolver::new(&host).resolve(&event).await.unwrap();
        assert_eq!(context.phase, Phase::Alpha);
        assert_eq!(context.version.tag(), "v1.2.0");
        assert_eq!(context.intent.map(|i| i.id), Some(7));
    }

    #[tokio::test]
    async fn published_release_is_not_an_intent() {
        let host = FakeHost::default().with_published("v1.2.0", "main");
        let event = MergeEvent::new("release/v1.2.0", "main").with_repository("acme/app");

        let context = ContextResolver::new(&host).resolve(&event).await.unwrap();
        assert!(context.intent.is_none());
    }
}
