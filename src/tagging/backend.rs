//! Tag creation through version control.

use super::prerelease::{PrereleaseKind, next_sequence, tag_glob};
use crate::branch::ReleaseVersion;
use crate::error::Result;
use crate::git::VersionControl;
use std::future::Future;

/// Trait for the component that owns tag creation
pub trait TagBackend {
    /// Create `tag`; when `stable`, also move `vMAJOR` and `vMAJOR.MINOR`.
    ///
    /// Returns the tag names that now point at the release, primary first.
    fn create_tags(&self, tag: &str, stable: bool) -> impl Future<Output = Result<Vec<String>>>;

    /// Next free prerelease number for a version and channel
    fn next_prerelease_number(
        &self,
        version: &ReleaseVersion,
        kind: PrereleaseKind,
    ) -> impl Future<Output = Result<u64>>;
}

/// [`TagBackend`] that tags HEAD through a [`VersionControl`] and pushes
#[derive(Debug)]
pub struct GitTagBackend<'a, V> {
    git: &'a V,
}

impl<'a, V: VersionControl> GitTagBackend<'a, V> {
    /// Wrap a version-control handle
    pub fn new(git: &'a V) -> Self {
        Self { git }
    }
}

impl<V: VersionControl> TagBackend for GitTagBackend<'_, V> {
    async fn create_tags(&self, tag: &str, stable: bool) -> Result<Vec<String>> {
        let mut created = Vec::new();

        // A published release may already have created the bare tag remotely
        let existing = self.git.list_tags(tag).await?;
        if existing.iter().any(|t| t == tag) {
            log::info!("tag {tag} already exists, leaving it in place");
        } else {
            self.git.create_tag(tag, None, false).await?;
            self.git.push_tag(tag, false).await?;
            log::info!("created tag {tag}");
        }
        created.push(tag.to_string());

        if stable && let Some(version) = ReleaseVersion::parse(tag) {
            for alias in version.smart_tags() {
                self.git.create_tag(&alias, None, true).await?;
                self.git.push_tag(&alias, true).await?;
                log::info!("moved {alias} to {tag}");
                created.push(alias);
            }
        }

        Ok(created)
    }

    async fn next_prerelease_number(&self, version: &ReleaseVersion, kind: PrereleaseKind) -> Result<u64> {
        let tags = self.git.list_tags(&tag_glob(version, kind)).await?;
        let next = next_sequence(&tags, version, kind);
        log::debug!("{} existing {kind} tag(s) for {version}, next is {next}", tags.len());
        Ok(next)
    }
}
