//! Release-hosting capability set.

use crate::error::Result;
use crate::github::{CheckRun, NewPullRequest, NewRelease, PullRequest, Release, ReleaseUpdate};
use crate::presence::Presence;
use std::future::Future;

/// Trait defining the release-hosting operations used by the release flow.
///
/// `repo` is always the `owner/name` full name.
pub trait ReleaseHost {
    /// List every release, following pagination
    fn list_releases(&self, repo: &str) -> impl Future<Output = Result<Vec<Release>>>;

    /// Create a release
    fn create_release(&self, repo: &str, release: &NewRelease) -> impl Future<Output = Result<Release>>;

    /// Update a release's draft/tag/target fields in one call
    fn update_release(
        &self,
        repo: &str,
        id: u64,
        update: &ReleaseUpdate,
    ) -> impl Future<Output = Result<Release>>;

    /// URL of the published release for a tag, if any
    fn release_url_by_tag(&self, repo: &str, tag: &str) -> impl Future<Output = Result<Option<String>>>;

    /// Open pull requests from `head` into `base`
    fn list_pull_requests(
        &self,
        repo: &str,
        head: &str,
        base: &str,
    ) -> impl Future<Output = Result<Vec<PullRequest>>>;

    /// Open a pull request
    fn create_pull_request(
        &self,
        repo: &str,
        pull: &NewPullRequest,
    ) -> impl Future<Output = Result<PullRequest>>;

    /// Attach labels to a pull request
    fn add_labels(&self, repo: &str, number: u64, labels: &[String]) -> impl Future<Output = Result<()>>;

    /// Check runs reported for the pull request's head commit
    fn pull_request_checks(&self, repo: &str, number: u64) -> impl Future<Output = Result<Vec<CheckRun>>>;

    /// Whether a branch exists on the hosting side
    fn branch_exists(&self, repo: &str, branch: &str) -> impl Future<Output = Presence>;
}
