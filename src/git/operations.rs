//! Version-control capability set used by the release workflow.
//!
//! This module defines the [`VersionControl`] trait: every git interaction the
//! release flow needs. The production implementation is
//! [`SystemGit`](super::SystemGit); tests use in-memory fakes.

use crate::error::Result;
use crate::presence::Presence;
use std::future::Future;
use std::path::PathBuf;

/// Trait defining all required Git operations for release orchestration
pub trait VersionControl {
    /// Fetch all tags from the remote, overwriting moved aliases locally
    fn fetch_tags(&self) -> impl Future<Output = Result<()>>;

    /// List tag names matching a glob (e.g. `v1.2.0-beta*`)
    fn list_tags(&self, pattern: &str) -> impl Future<Output = Result<Vec<String>>>;

    /// Create a lightweight tag at `target` (HEAD when `None`)
    fn create_tag(
        &self,
        name: &str,
        target: Option<&str>,
        force: bool,
    ) -> impl Future<Output = Result<()>>;

    /// Delete a local tag
    fn delete_tag(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Push a single tag to the remote
    fn push_tag(&self, name: &str, force: bool) -> impl Future<Output = Result<()>>;

    /// Create a local branch pointing at `start_point`
    fn create_branch(&self, name: &str, start_point: &str) -> impl Future<Output = Result<()>>;

    /// Delete a local branch
    fn delete_local_branch(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Delete a branch on the remote
    fn delete_remote_branch(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Push a local branch to the remote under the same name
    fn push_branch(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Push HEAD to a remote branch
    fn push_head_to(&self, branch: &str) -> impl Future<Output = Result<()>>;

    /// Whether a local branch exists
    fn local_branch_exists(&self, name: &str) -> impl Future<Output = Presence>;

    /// Whether a branch exists on the remote
    fn remote_branch_exists(&self, name: &str) -> impl Future<Output = Presence>;

    /// Resolve a ref to a commit SHA, `None` when it does not resolve
    fn resolve_commit(&self, reference: &str) -> impl Future<Output = Result<Option<String>>>;

    /// Most recent tag reachable from HEAD matching `pattern`, skipping `exclude`
    fn describe_latest_tag(
        &self,
        pattern: &str,
        exclude: Option<&str>,
    ) -> impl Future<Output = Result<Option<String>>>;

    /// Stage the given paths and commit them; `None` when nothing changed
    fn commit_paths(
        &self,
        paths: &[PathBuf],
        message: &str,
    ) -> impl Future<Output = Result<Option<CommitInfo>>>;

    /// Configure the commit identity for this repository
    fn configure_identity(&self, name: &str, email: &str) -> impl Future<Output = Result<()>>;
}

/// Information about a Git commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit hash (full SHA)
    pub hash: String,
    /// Commit message
    pub message: String,
}

impl CommitInfo {
    /// Abbreviated hash for display
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(7)]
    }
}
