//! Alpha and beta prereleases.

use super::{PhaseExecutor, PrereleaseOutcome};
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::git::VersionControl;
use crate::github::{NewRelease, ReleaseHost};
use crate::tagging::{Prerelease, PrereleaseKind, TagBackend};

impl<V, H, T> PhaseExecutor<'_, V, H, T>
where
    V: VersionControl,
    H: ReleaseHost,
    T: TagBackend,
{
    /// Tag, stamp and publish the next prerelease of `kind`
    pub(super) async fn run_prerelease(
        &self,
        context: &ReleaseContext,
        kind: PrereleaseKind,
    ) -> Result<PrereleaseOutcome> {
        let version = &context.version;
        let number = self.tagger.next_prerelease_number(version, kind).await?;
        let prerelease = Prerelease { kind, number };
        let tag = prerelease.tag_for(version);
        log::info!("{kind} release {tag} from {}", context.source_branch);

        let tags_created = self.tagger.create_tags(&tag, false).await?;

        self.stamp_and_push(version, Some(&prerelease.stamp_label()), &context.target_branch)
            .await?;

        let release_url = match self.host.release_url_by_tag(&context.repository, &tag).await? {
            Some(url) => {
                log::info!("prerelease record for {tag} already exists, reusing {url}");
                url
            }
            None => {
                let record = NewRelease {
                    tag_name: tag.clone(),
                    target_commitish: context.target_branch.clone(),
                    name: tag.clone(),
                    body: format!(
                        "{kind} build {number} of {version}, merged from {}.",
                        context.source_branch
                    ),
                    draft: false,
                    prerelease: true,
                };
                self.host.create_release(&context.repository, &record).await?.html_url
            }
        };

        Ok(PrereleaseOutcome {
            release_url,
            tags_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::FlowConfig;
    use crate::context::{MergeEvent, ReleaseContext};
    use crate::fakes::{FakeGit, FakeHost, FakeTagger};
    use crate::phases::{PhaseExecutor, PhaseOutcome};
    use crate::version::VersionStamper;
    use tempfile::TempDir;

    fn stamper_with_version_file(dir: &TempDir) -> VersionStamper {
        std::fs::write(dir.path().join("VERSION"), "0.0.0\n").unwrap();
        VersionStamper::new(dir.path(), Vec::new())
    }

    #[tokio::test]
    async fn beta_tags_stamps_and_publishes() {
        let dir = TempDir::new().unwrap();
        let stamper = stamper_with_version_file(&dir);
        let (git, host, tagger) = (FakeGit::default(), FakeHost::default(), FakeTagger::default());
        let config = FlowConfig::default();
        let executor = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config);

        let event = MergeEvent::new("fix/y", "release/v1.0.0").with_repository("acme/app");
        let context = ReleaseContext::from_event(&event, None).unwrap();
        let PhaseOutcome::Beta(outcome) = executor.execute(&context).await.unwrap() else {
            panic!("expected a beta outcome");
        };

        assert_eq!(outcome.tags_created, vec!["v1.0.0-beta.1"]);
        assert!(outcome.release_url.ends_with("/releases/tag/v1.0.0-beta.1"));
        assert_eq!(std::fs::read_to_string(dir.path().join("VERSION")).unwrap(), "1.0.0-beta1\n");

        let calls = git.calls();
        assert!(calls.contains(&"commit_paths chore(release): v1.0.0-beta1 [skip ci]".to_string()));
        assert!(calls.contains(&"push_head_to release/v1.0.0".to_string()));

        let release = &host.releases()[0];
        assert!(release.prerelease && !release.draft);
        assert_eq!(release.target_commitish, "release/v1.0.0");
    }

    #[tokio::test]
    async fn alpha_numbering_continues_from_existing_tags() {
        let dir = TempDir::new().unwrap();
        let stamper = stamper_with_version_file(&dir);
        let git = FakeGit::default();
        let host = FakeHost::default();
        let tagger = FakeTagger::default().with_existing(&["v1.2.0-alpha.1", "v1.2.0-alpha2"]);
        let config = FlowConfig::default();
        let executor = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config);

        let event = MergeEvent::new("feature/x", "dev/v1.2.0").with_repository("acme/app");
        let context = ReleaseContext::from_event(&event, None).unwrap();
        let outcome = executor.execute(&context).await.unwrap();

        let PhaseOutcome::Alpha(outcome) = outcome else {
            panic!("expected an alpha outcome");
        };
        assert_eq!(outcome.tags_created, vec!["v1.2.0-alpha.3"]);
    }

    #[tokio::test]
    async fn existing_prerelease_record_is_reused() {
        let dir = TempDir::new().unwrap();
        let stamper = stamper_with_version_file(&dir);
        let git = FakeGit::default();
        let host = FakeHost::default().with_published("v1.0.0-beta.1", "release/v1.0.0");
        let tagger = FakeTagger::default();
        let config = FlowConfig::default();
        let executor = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config);

        let event = MergeEvent::new("fix/y", "release/v1.0.0").with_repository("acme/app");
        let context = ReleaseContext::from_event(&event, None).unwrap();
        executor.execute(&context).await.unwrap();

        assert_eq!(host.releases().len(), 1);
        assert!(host.calls().iter().all(|c| !c.starts_with("create_release")));
    }
}
