//! Stable release: stamp, publish the intent, tag, then backflow.

use super::{BackflowSync, PhaseExecutor, StableOutcome};
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::git::VersionControl;
use crate::github::{NewRelease, ReleaseHost, ReleaseUpdate};
use crate::tagging::TagBackend;

impl<V, H, T> PhaseExecutor<'_, V, H, T>
where
    V: VersionControl,
    H: ReleaseHost,
    T: TagBackend,
{
    pub(super) async fn run_stable(&self, context: &ReleaseContext) -> Result<StableOutcome> {
        let version = &context.version;
        let tag = version.tag();
        let main = context.target_branch.as_str();
        log::info!("stable release {tag} on {main}");

        self.stamp_and_push(version, None, main).await?;

        // Tags are created after publishing; publishing may already create the bare tag
        let release_url = match &context.intent {
            Some(intent) => {
                let update = ReleaseUpdate {
                    draft: Some(false),
                    tag_name: Some(tag.clone()),
                    target_commitish: Some(main.to_string()),
                };
                self.host
                    .update_release(&context.repository, intent.id, &update)
                    .await?;
                log::info!("published draft intent {} for {tag}", intent.id);
                intent.url.clone()
            }
            None => {
                let record = NewRelease {
                    tag_name: tag.clone(),
                    target_commitish: main.to_string(),
                    name: tag.clone(),
                    body: format!("Stable release {tag}."),
                    draft: false,
                    prerelease: false,
                };
                let created = self.host.create_release(&context.repository, &record).await?;
                log::info!("published release {tag}");
                created.html_url
            }
        };

        let tags_created = self.tagger.create_tags(&tag, true).await?;

        let backflow = BackflowSync::new(self.host, main, &self.config.backflow_label);
        let backflow_prs = backflow.run(&context.repository, version).await;

        Ok(StableOutcome {
            release_url,
            tags_created,
            backflow_prs,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::FlowConfig;
    use crate::context::{ContextResolver, MergeEvent};
    use crate::fakes::{CallJournal, FakeGit, FakeHost, FakeTagger};
    use crate::phases::{PhaseExecutor, PhaseOutcome};
    use crate::version::VersionStamper;
    use tempfile::TempDir;

    #[tokio::test]
    async fn publishes_intent_then_tags() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("VERSION"), "1.0.0-beta3\n").unwrap();
        let stamper = VersionStamper::new(dir.path(), Vec::new());
        let journal = CallJournal::default();
        let git = FakeGit::default().with_journal(&journal);
        let host = FakeHost::default()
            .with_draft(99999, "v1.0.0", "dev/v1.0.0", "https://example.test/u")
            .with_journal(&journal);
        let tagger = FakeTagger::default().with_journal(&journal);
        let config = FlowConfig::default();

        let event = MergeEvent::new("release/v1.0.0", "main").with_repository("acme/app");
        let context = ContextResolver::new(&host).resolve(&event).await.unwrap();
        let outcome = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config)
            .execute(&context)
            .await
            .unwrap();

        let PhaseOutcome::Stable(outcome) = outcome else {
            panic!("expected a stable outcome");
        };
        assert_eq!(outcome.release_url, "https://example.test/u");
        assert_eq!(outcome.tags_created, vec!["v1.0.0", "v1", "v1.0"]);

        let published = &host.releases()[0];
        assert!(!published.draft);
        assert_eq!(published.target_commitish, "main");
        assert_eq!(std::fs::read_to_string(dir.path().join("VERSION")).unwrap(), "1.0.0\n");
        assert!(git.calls().contains(&"push_head_to main".to_string()));

        let pushed = journal.position("push_head_to main").unwrap();
        let published = journal.position("update_release 99999").unwrap();
        let tagged = journal.position("create_tags v1.0.0 stable").unwrap();
        assert!(pushed < published, "stamp is pushed before publishing");
        assert!(published < tagged, "intent is published before tagging");
    }

    #[tokio::test]
    async fn creates_published_release_without_intent() {
        let dir = TempDir::new().unwrap();
        let stamper = VersionStamper::new(dir.path(), Vec::new());
        let (git, host, tagger) = (FakeGit::default(), FakeHost::default(), FakeTagger::default());
        let config = FlowConfig::default();

        let event = MergeEvent::new("release/v2.1.0", "main").with_repository("acme/app");
        let context = ContextResolver::new(&host).resolve(&event).await.unwrap();
        let PhaseOutcome::Stable(outcome) = PhaseExecutor::new(&git, &host, &tagger, &stamper, &config)
            .execute(&context)
            .await
            .unwrap()
        else {
            panic!("expected a stable outcome");
        };

        assert!(outcome.release_url.ends_with("/releases/tag/v2.1.0"));
        let release = &host.releases()[0];
        assert!(!release.draft && !release.prerelease);
    }
}
