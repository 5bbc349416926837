//! Merge event descriptor read from a GitHub `pull_request` event document.

use crate::error::{ContextError, Result};
use serde_json::Value;
use std::path::Path;

/// The merge a release run reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEvent {
    /// Head branch
    pub source_branch: String,
    /// Base branch
    pub target_branch: String,
    /// `owner/name`, when known
    pub repository: Option<String>,
    /// Pull request number, when known
    pub pull_request: Option<u64>,
}

impl MergeEvent {
    /// Build an event directly from a branch pair
    pub fn new(source_branch: impl Into<String>, target_branch: impl Into<String>) -> Self {
        Self {
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
            repository: None,
            pull_request: None,
        }
    }

    /// Set the repository identity
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Set the pull request number
    pub fn with_pull_request(mut self, number: u64) -> Self {
        self.pull_request = Some(number);
        self
    }

    /// Read the event document at `path`.
    ///
    /// `fallback_repository` is used when the document carries no
    /// `repository.full_name`.
    pub fn load(path: &Path, fallback_repository: Option<&str>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ContextError::EventSourceNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let document: Value = serde_json::from_str(&content).map_err(|e| ContextError::EventMalformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_document(&document, path, fallback_repository)
    }

    fn from_document(document: &Value, path: &Path, fallback_repository: Option<&str>) -> Result<Self> {
        let pull = &document["pull_request"];
        let branch = |side: &str| -> Result<String> {
            pull[side]["ref"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ContextError::EventMalformed {
                        path: path.to_path_buf(),
                        reason: format!("pull_request.{side}.ref is missing"),
                    }
                    .into()
                })
        };

        let source_branch = branch("head")?;
        let target_branch = branch("base")?;
        let pull_request = pull["number"].as_u64().or_else(|| document["number"].as_u64());
        let repository = document["repository"]["full_name"]
            .as_str()
            .map(str::to_string)
            .or_else(|| fallback_repository.map(str::to_string));

        Ok(Self {
            source_branch,
            target_branch,
            repository,
            pull_request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_json(json: &str, fallback: Option<&str>) -> Result<MergeEvent> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, json).unwrap();
        MergeEvent::load(&path, fallback)
    }

    #[test]
    fn reads_pull_request_event() {
        let event = load_json(
            r#"{"pull_request": {"number": 12, "head": {"ref": "feature/x"}, "base": {"ref": "dev/v1.2.0"}},
                "repository": {"full_name": "acme/app"}}"#,
            Some("other/repo"),
        )
        .unwrap();
        assert_eq!(event.source_branch, "feature/x");
        assert_eq!(event.target_branch, "dev/v1.2.0");
        assert_eq!(event.repository.as_deref(), Some("acme/app"));
        assert_eq!(event.pull_request, Some(12));
    }

    #[test]
    fn falls_back_to_top_level_number_and_env_repository() {
        let event = load_json(
            r#"{"number": 5, "pull_request": {"head": {"ref": "fix/y"}, "base": {"ref": "main"}}}"#,
            Some("acme/app"),
        )
        .unwrap();
        assert_eq!(event.pull_request, Some(5));
        assert_eq!(event.repository.as_deref(), Some("acme/app"));
    }

    #[test]
    fn missing_file_is_event_source_not_found() {
        let err = MergeEvent::load(Path::new("/nonexistent/event.json"), None).unwrap_err();
        assert!(err.to_string().contains("Event source not found"));
    }

    #[test]
    fn missing_refs_are_malformed() {
        let err = load_json(r#"{"pull_request": {"head": {"ref": "x"}}}"#, None).unwrap_err();
        assert!(err.to_string().contains("base.ref"));
    }
}
