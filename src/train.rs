//! Release-train initiation: create `dev/vX.Y.Z` and its draft intent together.
//!
//! Preconditions PD-1 to PD-4 are checked before anything is created. Once
//! the branch exists, a failure to push it or to create the intent deletes
//! the branch again (local and remote, best effort) and the original error
//! is returned.

use crate::branch::ReleaseVersion;
use crate::context::find_intent;
use crate::error::{ReleaseError, Result, TrainError};
use crate::git::VersionControl;
use crate::github::{NewRelease, ReleaseHost};
use crate::presence::Presence;
use serde::Serialize;

/// Glob for stable version tags
const STABLE_TAG_GLOB: &str = "v[0-9]*";
/// Glob for tags with a prerelease suffix
const PRERELEASE_TAG_GLOB: &str = "*-*";

/// Result of starting a train
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainOutcome {
    /// Created development branch
    pub dev_branch: String,
    /// Draft intent URL
    pub intent_url: String,
    /// Commit the branch starts from
    pub base_commit: String,
}

/// Starts release trains
#[derive(Debug)]
pub struct TrainInitiator<'a, V, H> {
    git: &'a V,
    host: &'a H,
    repository: &'a str,
    main_branch: &'a str,
}

impl<'a, V: VersionControl, H: ReleaseHost> TrainInitiator<'a, V, H> {
    /// Create an initiator for `repository`
    pub fn new(git: &'a V, host: &'a H, repository: &'a str, main_branch: &'a str) -> Self {
        Self {
            git,
            host,
            repository,
            main_branch,
        }
    }

    /// Start the train for `version` (`X.Y.Z` or `vX.Y.Z`) from `base`.
    ///
    /// Without a base, the latest stable tag is used, then the main branch.
    pub async fn start(&self, version: &str, base: Option<&str>) -> Result<TrainOutcome> {
        let version = ReleaseVersion::parse(version).ok_or_else(|| TrainError::InvalidVersion {
            version: version.to_string(),
        })?;
        let tag = version.tag();
        let branch = version.dev_branch();

        // Tags created by other runs must be visible before PD-2
        let fetched = self.git.fetch_tags().await;

        self.check_no_intent(&version).await?;
        self.check_no_tag(&tag, fetched).await?;
        self.check_no_branch(&branch).await?;
        let base_commit = self.resolve_base(base).await?;
        log::info!("preconditions passed; starting {branch} at {base_commit}");

        self.git.create_branch(&branch, &base_commit).await?;

        match self.publish(&version, &branch).await {
            Ok(intent_url) => {
                log::info!("release train {tag} started: {intent_url}");
                Ok(TrainOutcome {
                    dev_branch: branch,
                    intent_url,
                    base_commit,
                })
            }
            Err(e) => {
                log::error!("starting {branch} failed, rolling back: {e}");
                self.rollback(&branch).await;
                Err(e)
            }
        }
    }

    /// PD-1
    async fn check_no_intent(&self, version: &ReleaseVersion) -> Result<()> {
        let releases = self.host.list_releases(self.repository).await?;
        match find_intent(&releases, version) {
            Some(intent) => Err(TrainError::IntentExists {
                version: version.tag(),
                url: intent.url,
            }
            .into()),
            None => Ok(()),
        }
    }

    /// PD-2; local tags only count once the remote tags were fetched
    async fn check_no_tag(&self, tag: &str, fetched: Result<()>) -> Result<()> {
        let tags = self.git.list_tags(tag).await?;
        if tags.iter().any(|t| t == tag) {
            return Err(TrainError::TagExists { tag: tag.to_string() }.into());
        }
        if let Err(e) = fetched {
            return Err(TrainError::TagUnverified {
                tag: tag.to_string(),
                reason: e.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// PD-3; an unanswered query fails too
    async fn check_no_branch(&self, branch: &str) -> Result<()> {
        for (location, presence) in [
            ("locally", self.git.local_branch_exists(branch).await),
            ("on the remote", self.git.remote_branch_exists(branch).await),
        ] {
            let reason = match presence {
                Presence::NotFound => continue,
                Presence::Exists => format!("already exists {location}"),
                Presence::QueryFailed(reason) => {
                    format!("could not be checked {location}: {reason}")
                }
            };
            return Err(TrainError::BranchConflict {
                branch: branch.to_string(),
                reason,
            }
            .into());
        }
        Ok(())
    }

    /// PD-4
    async fn resolve_base(&self, base: Option<&str>) -> Result<String> {
        let candidates: Vec<String> = match base {
            Some(base) => vec![base.to_string()],
            None => {
                let mut refs = Vec::new();
                if let Some(latest) = self
                    .git
                    .describe_latest_tag(STABLE_TAG_GLOB, Some(PRERELEASE_TAG_GLOB))
                    .await?
                {
                    refs.push(latest);
                }
                refs.push(self.main_branch.to_string());
                refs.push(format!("origin/{}", self.main_branch));
                refs
            }
        };

        for reference in &candidates {
            if let Some(commit) = self.git.resolve_commit(reference).await? {
                log::info!("base {reference} resolves to {commit}");
                return Ok(commit);
            }
        }
        Err(TrainError::BaseUnresolvable {
            reference: candidates.join(", "),
        }
        .into())
    }

    async fn publish(&self, version: &ReleaseVersion, branch: &str) -> Result<String> {
        self.git.push_branch(branch).await?;
        let intent = NewRelease {
            tag_name: version.tag(),
            target_commitish: branch.to_string(),
            name: format!("Release Intent: {version}"),
            body: format!(
                "Declares the {version} release train. Work merges into `{branch}`; \
                 this draft is published when the release reaches {}.",
                self.main_branch
            ),
            draft: true,
            prerelease: false,
        };
        let created = self.host.create_release(self.repository, &intent).await?;
        Ok(created.html_url)
    }

    async fn rollback(&self, branch: &str) {
        if let Err(e) = self.git.delete_remote_branch(branch).await {
            warn_rollback(branch, "remote", &e);
        }
        if let Err(e) = self.git.delete_local_branch(branch).await {
            warn_rollback(branch, "local", &e);
        }
    }
}

fn warn_rollback(branch: &str, side: &str, error: &ReleaseError) {
    log::warn!("rollback could not delete {side} branch {branch}: {error}; remove it manually");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGit, FakeHost};

    #[tokio::test]
    async fn creates_branch_and_draft_intent() {
        let git = FakeGit::default().with_latest_stable("v1.2.0");
        let host = FakeHost::default();
        let outcome = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("1.3.0", None)
            .await
            .unwrap();

        assert_eq!(outcome.dev_branch, "dev/v1.3.0");
        assert_eq!(outcome.base_commit, "commit-of-v1.2.0");
        assert!(git.remote_branches().contains(&"dev/v1.3.0".to_string()));

        let intent = &host.releases()[0];
        assert!(intent.draft);
        assert_eq!(intent.tag_name, "v1.3.0");
        assert_eq!(intent.name.as_deref(), Some("Release Intent: v1.3.0"));
        assert_eq!(intent.target_commitish, "dev/v1.3.0");
        assert_eq!(outcome.intent_url, intent.html_url);
    }

    #[tokio::test]
    async fn falls_back_to_main_without_stable_tags() {
        let git = FakeGit::default().with_ref("main", "cafe");
        let host = FakeHost::default();
        let outcome = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("v0.1.0", None)
            .await
            .unwrap();
        assert_eq!(outcome.base_commit, "cafe");
    }

    #[tokio::test]
    async fn existing_intent_fails_pd1() {
        let git = FakeGit::default();
        let host = FakeHost::default().with_draft(4, "v2.0.0", "dev/v2.0.0", "https://example.test/4");
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0.0", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Train(TrainError::IntentExists { .. })));
    }

    #[tokio::test]
    async fn tag_fetch_failure_fails_pd2() {
        let git = FakeGit::default().fail_on("fetch_tags");
        let host = FakeHost::default();
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0.0", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReleaseError::Train(TrainError::TagUnverified { ref tag, .. }) if tag == "v2.0.0"
        ));
        assert!(!err.recovery_suggestions().is_empty());
        assert!(git.calls().iter().all(|c| !c.starts_with("create_branch") && !c.starts_with("push_branch")));
        assert!(host.releases().is_empty());
    }

    #[tokio::test]
    async fn branch_query_failure_fails_pd3() {
        let git = FakeGit::default().fail_on("remote_branch_exists");
        let host = FakeHost::default();
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0.0", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Train(TrainError::BranchConflict { .. })));
        assert!(git.calls().iter().all(|c| !c.starts_with("create_branch")));
    }

    #[tokio::test]
    async fn unresolvable_base_fails_pd4() {
        let git = FakeGit::default();
        let host = FakeHost::default();
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0.0", Some("no-such-ref"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Train(TrainError::BaseUnresolvable { .. })));
    }

    #[tokio::test]
    async fn push_failure_rolls_back_and_keeps_original_error() {
        let git = FakeGit::default().fail_on("push_branch").fail_on("delete_remote_branch");
        let host = FakeHost::default();
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0.0", None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("push_branch dev/v2.0.0"));
        assert!(!git.local_branches().contains(&"dev/v2.0.0".to_string()));
        assert!(host.releases().is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_versions() {
        let git = FakeGit::default();
        let host = FakeHost::default();
        let err = TrainInitiator::new(&git, &host, "acme/app", "main")
            .start("2.0", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Train(TrainError::InvalidVersion { .. })));
        assert!(git.calls().is_empty());
    }
}
