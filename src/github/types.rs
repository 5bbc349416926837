//! Release-hosting records as returned by the GitHub REST API.

use serde::{Deserialize, Serialize};

/// A release record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release ID
    pub id: u64,
    /// Whether the release is still a draft
    pub draft: bool,
    /// Tag the release points at
    pub tag_name: String,
    /// Release title
    #[serde(default)]
    pub name: Option<String>,
    /// Release notes
    #[serde(default)]
    pub body: Option<String>,
    /// Branch or commit the tag is created from
    pub target_commitish: String,
    /// Whether the release is marked as a prerelease
    #[serde(default)]
    pub prerelease: bool,
    /// Release page URL
    pub html_url: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Payload for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    /// Tag name
    pub tag_name: String,
    /// Branch or commit to tag from
    pub target_commitish: String,
    /// Release title
    pub name: String,
    /// Release notes
    pub body: String,
    /// Create as draft
    pub draft: bool,
    /// Mark as prerelease
    pub prerelease: bool,
}

/// Partial update of a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseUpdate {
    /// New draft flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// New tag name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    /// New target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
}

/// A pull request reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// PR page URL
    pub html_url: String,
}

/// Payload for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Title
    pub title: String,
    /// Head branch
    pub head: String,
    /// Base branch
    pub base: String,
    /// Description
    pub body: String,
    /// Open as draft
    pub draft: bool,
}

/// A CI check run attached to a pull request head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check name
    pub name: String,
    /// Conclusion, `None` while the check is pending
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// An unpublished release record acting as the declared plan for a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftIntent {
    /// Release ID, used to publish later
    pub id: u64,
    /// Version tag the intent targets
    pub tag_name: String,
    /// Branch the release will land on
    pub target_branch: String,
    /// Always false while the record is an intent
    pub is_published: bool,
    /// Release page URL
    pub url: String,
}

impl DraftIntent {
    /// View a draft release as an intent, `None` for published records
    pub fn from_release(release: &Release) -> Option<Self> {
        release.draft.then(|| Self {
            id: release.id,
            tag_name: release.tag_name.clone(),
            target_branch: release.target_commitish.clone(),
            is_published: false,
            url: release.html_url.clone(),
        })
    }
}
