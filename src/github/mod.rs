//! GitHub integration for release operations
//!
//! [`ReleaseHost`] is the capability set the workflow consumes;
//! [`GitHubClient`] implements it on the REST API.

mod client;
mod host;
mod retry;
mod types;

pub use client::{GitHubClient, GitHubConfig};
pub use host::ReleaseHost;
pub use retry::retry_with_backoff;
pub use types::{
    CheckRun, DraftIntent, NewPullRequest, NewRelease, PullRequest, Release, ReleaseUpdate,
};
