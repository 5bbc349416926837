//! Error types for release_flow operations.
//!
//! Every fatal condition carries a specific cause and, through
//! [`ReleaseError::recovery_suggestions`], concrete remediation steps. This is
//! the only diagnostic surface operators get, so messages name the rule that
//! triggered.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release_flow operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release_flow operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Context resolution errors
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// A guardrail rejected the release
    #[error("{0}")]
    Guardrail(#[from] GuardrailFailure),

    /// Release-train initiation errors
    #[error("Release train error: {0}")]
    Train(#[from] TrainError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Release-hosting API errors
    #[error("Hosting error: {0}")]
    Hosting(#[from] HostingError),

    /// Version stamping errors
    #[error("Stamp error: {0}")]
    Stamp(#[from] StampError),

    /// Configuration file errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while deriving a release context from a merge event
#[derive(Error, Debug)]
pub enum ContextError {
    /// Event document missing or unreadable
    #[error("Event source not found at {path}: {reason}")]
    EventSourceNotFound {
        /// Path that was looked up
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Event document present but not usable
    #[error("Event source at {path} is malformed: {reason}")]
    EventMalformed {
        /// Path of the event document
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Branch pair does not map onto any release phase
    #[error("Cannot determine release phase for merge '{source_branch}' -> '{target_branch}'")]
    PhaseUndetermined {
        /// Head branch of the merge
        source_branch: String,
        /// Base branch of the merge
        target_branch: String,
    },

    /// Neither branch carries a MAJOR.MINOR.PATCH version
    #[error("Cannot determine release version from '{source_branch}' or '{target_branch}'")]
    VersionNotFound {
        /// Head branch of the merge
        source_branch: String,
        /// Base branch of the merge
        target_branch: String,
    },

    /// No repository identity available
    #[error("Repository context missing: {reason}")]
    RepositoryMissing {
        /// Reason for the error
        reason: String,
    },
}

/// A guardrail failure surfaced to the caller
#[derive(Error, Debug, Clone)]
#[error("Guardrail {id} ({name}) failed: {message}")]
pub struct GuardrailFailure {
    /// Guardrail identifier (G1..G5)
    pub id: String,
    /// Human-readable guardrail name
    pub name: String,
    /// Cause and remediation
    pub message: String,
}

/// Release-train initiation errors
#[derive(Error, Debug)]
pub enum TrainError {
    /// Version argument is not MAJOR.MINOR.PATCH
    #[error("Invalid train version '{version}': expected MAJOR.MINOR.PATCH (for example 2.0.0)")]
    InvalidVersion {
        /// Raw version argument
        version: String,
    },

    /// PD-1: an unpublished intent already exists
    #[error("PD-1 failed: a draft intent for {version} already exists ({url})")]
    IntentExists {
        /// Normalized version
        version: String,
        /// URL of the existing draft
        url: String,
    },

    /// PD-2: the version tag already exists
    #[error("PD-2 failed: tag {tag} already exists")]
    TagExists {
        /// Tag name
        tag: String,
    },

    /// PD-2: remote tags could not be fetched, so the tag cannot be ruled out
    #[error("PD-2 failed: could not confirm tag {tag} is unreleased: {reason}")]
    TagUnverified {
        /// Tag name
        tag: String,
        /// Reason for the error
        reason: String,
    },

    /// PD-3: the dev branch already exists, or could not be checked
    #[error("PD-3 failed: branch {branch} {reason}")]
    BranchConflict {
        /// Branch name
        branch: String,
        /// Reason for the error
        reason: String,
    },

    /// PD-4: the base reference does not resolve
    #[error("PD-4 failed: base reference '{reference}' does not resolve to a commit")]
    BaseUnresolvable {
        /// Reference that was resolved
        reference: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// git executable not found on PATH
    #[error("git executable not found on PATH")]
    NotInstalled,

    /// Git command exited non-zero
    #[error("Git command failed: {command} - {stderr}")]
    CommandFailed {
        /// Command that failed
        command: String,
        /// Captured stderr
        stderr: String,
    },

    /// Git command could not be spawned
    #[error("Failed to run {command}: {reason}")]
    SpawnFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Git command exceeded its time budget
    #[error("Git command timed out after {seconds}s: {command}")]
    Timeout {
        /// Command that timed out
        command: String,
        /// Timeout in seconds
        seconds: u64,
    },
}

/// Release-hosting API errors
#[derive(Error, Debug)]
pub enum HostingError {
    /// No API token configured
    #[error("GitHub token not provided. Set GH_TOKEN or GITHUB_TOKEN.")]
    MissingToken,

    /// Transport-level failure
    #[error("{operation} request failed: {reason}")]
    Request {
        /// API operation
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// Non-success HTTP status
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        /// API operation
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Request exceeded its time budget
    #[error("{operation} timed out")]
    Timeout {
        /// API operation
        operation: String,
    },
}

/// Version stamping errors
#[derive(Error, Debug)]
pub enum StampError {
    /// Target file does not exist
    #[error("Version file not found: {path}")]
    FileNotFound {
        /// Missing path
        path: PathBuf,
    },

    /// File has no recognizable version field
    #[error("No version field found in {path} ({file_type})")]
    FieldNotFound {
        /// File path
        path: PathBuf,
        /// Stamper file type
        file_type: String,
    },

    /// File could not be read, parsed or written
    #[error("Failed to stamp {path}: {reason}")]
    UpdateFailed {
        /// File path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("Failed to read config {path}: {reason}")]
    Unreadable {
        /// Config path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Config file failed to parse
    #[error("Invalid config {path}: {source}")]
    Invalid {
        /// Config path
        path: PathBuf,
        /// Parse error
        #[source]
        source: toml::de::Error,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Context(ContextError::EventSourceNotFound { .. }) => vec![
                "Run inside a pull_request workflow so GITHUB_EVENT_PATH is set".to_string(),
                "Or pass the event document explicitly: release_flow merge --event <path>"
                    .to_string(),
            ],
            ReleaseError::Context(ContextError::PhaseUndetermined { .. }) => vec![
                "Merge into dev/vX.Y.Z (alpha), release/vX.Y.Z (beta/freeze) or main (stable)"
                    .to_string(),
                "Branch names must match exactly, including the 'v' marker".to_string(),
            ],
            ReleaseError::Context(ContextError::VersionNotFound { .. }) => vec![
                "Include the version in the branch name, e.g. dev/v1.2.0 or release/v1.2.0"
                    .to_string(),
            ],
            ReleaseError::Context(ContextError::RepositoryMissing { .. }) => vec![
                "Set GITHUB_REPOSITORY=owner/repo or pass --repo owner/repo".to_string(),
            ],
            ReleaseError::Guardrail(failure) => {
                vec![format!(
                    "Resolve guardrail {} as described above, then re-run the workflow",
                    failure.id
                )]
            }
            ReleaseError::Train(TrainError::IntentExists { version, url }) => vec![
                format!("A train for {version} is already open: {url}"),
                "Continue work on the existing dev branch, or delete the draft before retrying"
                    .to_string(),
            ],
            ReleaseError::Train(TrainError::TagExists { tag }) => vec![
                format!("{tag} was already released; choose the next version"),
                "List released versions with: git tag --list 'v*'".to_string(),
            ],
            ReleaseError::Train(TrainError::TagUnverified { tag, .. }) => vec![
                "Check access to the remote: git fetch --tags origin".to_string(),
                format!("Confirm {tag} is not on the remote: git ls-remote --tags origin {tag}"),
            ],
            ReleaseError::Train(TrainError::BranchConflict { branch, .. }) => vec![
                format!("Inspect the branch: git ls-remote --heads origin {branch}"),
                format!("If it is stale, delete it: git push origin --delete {branch}"),
            ],
            ReleaseError::Train(TrainError::BaseUnresolvable { .. }) => vec![
                "Fetch the reference first: git fetch --tags origin".to_string(),
                "Pass an existing tag, branch or commit with --base".to_string(),
            ],
            ReleaseError::Git(GitError::NotInstalled) => vec![
                "Install git and make sure it is on PATH".to_string(),
            ],
            ReleaseError::Git(GitError::Timeout { .. }) => vec![
                "Check network connectivity to the remote".to_string(),
                "Raise git_timeout_secs in release-flow.toml".to_string(),
            ],
            ReleaseError::Hosting(HostingError::MissingToken) => vec![
                "Export GH_TOKEN or GITHUB_TOKEN with contents and pull-requests write scope"
                    .to_string(),
            ],
            ReleaseError::Hosting(HostingError::Status { status, .. })
                if *status == 401 || *status == 403 =>
            {
                vec![
                    "Verify the token is valid and has contents: write permission".to_string(),
                    "In GitHub Actions grant `permissions: contents: write, pull-requests: write`"
                        .to_string(),
                ]
            }
            ReleaseError::Stamp(StampError::FileNotFound { path }) => vec![
                format!("Create {} or remove it from [[stamp]] in release-flow.toml", path.display()),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReleaseError::Hosting(HostingError::Request { .. })
            | ReleaseError::Hosting(HostingError::Timeout { .. })
            | ReleaseError::Git(GitError::Timeout { .. })
            | ReleaseError::Train(TrainError::TagUnverified { .. }) => true,
            ReleaseError::Hosting(HostingError::Status { status, .. }) => {
                *status >= 500 || *status == 429
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardrail_failure_display_names_the_rule() {
        let err = ReleaseError::from(GuardrailFailure {
            id: "G3".to_string(),
            name: "Only fixes during stabilization".to_string(),
            message: "feature/x is not a fix branch".to_string(),
        });
        let text = err.to_string();
        assert!(text.contains("G3"));
        assert!(text.contains("feature/x is not a fix branch"));
        assert!(err.recovery_suggestions()[0].contains("G3"));
    }

    #[test]
    fn only_transient_errors_are_recoverable() {
        let server = ReleaseError::from(HostingError::Status {
            operation: "list releases".to_string(),
            status: 502,
            body: String::new(),
        });
        let denied = ReleaseError::from(HostingError::Status {
            operation: "list releases".to_string(),
            status: 403,
            body: String::new(),
        });
        assert!(server.is_recoverable());
        assert!(!denied.is_recoverable());
        assert!(!ReleaseError::from(TrainError::TagExists { tag: "v1.0.0".into() }).is_recoverable());
    }
}
