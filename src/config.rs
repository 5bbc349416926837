//! Configuration: process environment snapshot and the optional TOML file.
//!
//! The environment is read once, in `main`, into [`EnvConfig`]. Everything
//! below the CLI receives explicit values ([`FreezeConfig`], [`CiPolicy`],
//! [`FlowConfig`]) instead of consulting the environment.

use crate::error::{ConfigError, Result};
use crate::version::StampTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file locations tried when `--config` is not given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = [".github/release-flow.toml", "release-flow.toml"];

/// Built-in CI self-check identifier
pub const DEFAULT_SELF_CHECK: &str = "releaseflow";

/// Snapshot of the environment variables the tool understands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// `GITHUB_EVENT_PATH`
    pub event_path: Option<PathBuf>,
    /// `GITHUB_REPOSITORY`
    pub repository: Option<String>,
    /// `GH_TOKEN`, falling back to `GITHUB_TOKEN`
    pub token: Option<String>,
    /// `GITHUB_API_URL`
    pub api_url: Option<String>,
    /// `GITHUB_JOB`
    pub job_name: Option<String>,
    /// `FEATURE_FREEZE`
    pub feature_freeze: bool,
    /// `FREEZE_OVERRIDE`
    pub freeze_override: bool,
    /// `GITHUB_OUTPUT`
    pub output_path: Option<PathBuf>,
}

impl EnvConfig {
    /// Read the current process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            event_path: get("GITHUB_EVENT_PATH").map(PathBuf::from),
            repository: get("GITHUB_REPOSITORY"),
            token: get("GH_TOKEN").or_else(|| get("GITHUB_TOKEN")),
            api_url: get("GITHUB_API_URL"),
            job_name: get("GITHUB_JOB"),
            feature_freeze: get("FEATURE_FREEZE").is_some_and(|v| is_truthy(&v)),
            freeze_override: get("FREEZE_OVERRIDE").is_some_and(|v| is_truthy(&v)),
            output_path: get("GITHUB_OUTPUT").map(PathBuf::from),
        }
    }

    /// Freeze flags as an explicit value
    pub fn freeze(&self) -> FreezeConfig {
        FreezeConfig {
            active: self.feature_freeze,
            override_active: self.freeze_override,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Global feature-freeze switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreezeConfig {
    /// Feature work is frozen
    pub active: bool,
    /// An operator has bypassed the freeze
    pub override_active: bool,
}

/// Which CI checks belong to this tool and are ignored when gating stable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiPolicy {
    /// Name of the job currently running
    pub job_name: Option<String>,
    /// Identifiers matched against normalized check names
    pub self_check_names: Vec<String>,
}

impl Default for CiPolicy {
    fn default() -> Self {
        Self {
            job_name: None,
            self_check_names: vec![DEFAULT_SELF_CHECK.to_string()],
        }
    }
}

impl CiPolicy {
    /// Policy with the built-in identifier plus `extra` names
    pub fn new(job_name: Option<String>, extra: &[String]) -> Self {
        let mut self_check_names = vec![DEFAULT_SELF_CHECK.to_string()];
        for name in extra {
            let normalized = normalize_check_name(name);
            if !normalized.is_empty() && !self_check_names.contains(&normalized) {
                self_check_names.push(normalized);
            }
        }
        Self {
            job_name,
            self_check_names,
        }
    }

    /// Whether a check run is this tool's own job
    pub fn is_self_check(&self, check_name: &str) -> bool {
        if self.job_name.as_deref() == Some(check_name) {
            return true;
        }
        let normalized = normalize_check_name(check_name);
        self.self_check_names
            .iter()
            .any(|id| normalized.contains(&normalize_check_name(id)))
    }
}

/// Lowercase and strip spaces, hyphens and underscores
pub fn normalize_check_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Settings from `release-flow.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowConfig {
    /// Git remote to push to
    pub remote: String,
    /// Stable branch name
    pub main_branch: String,
    /// Author name for stamping commits
    pub commit_name: String,
    /// Author email for stamping commits
    pub commit_email: String,
    /// Label put on backflow pull requests
    pub backflow_label: String,
    /// Extra CI check identifiers treated as this tool
    pub self_check_names: Vec<String>,
    /// Per git command timeout
    pub git_timeout_secs: u64,
    /// Per HTTP request timeout
    pub http_timeout_secs: u64,
    /// Files to stamp with the release version
    pub stamp: Vec<StampTarget>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            main_branch: "main".to_string(),
            commit_name: "github-actions[bot]".to_string(),
            commit_email: "41898282+github-actions[bot]@users.noreply.github.com".to_string(),
            backflow_label: "backflow".to_string(),
            self_check_names: Vec::new(),
            git_timeout_secs: 120,
            http_timeout_secs: 60,
            stamp: Vec::new(),
        }
    }
}

impl FlowConfig {
    /// Load `explicit` if given, else the first default path present, else defaults
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in DEFAULT_CONFIG_PATHS {
            let path = root.join(candidate);
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        log::debug!("no release-flow.toml found, using defaults");
        Ok(Self::default())
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Git command timeout
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::StampKind;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn env_snapshot_reads_known_variables() {
        let vars: HashMap<&str, &str> = [
            ("GITHUB_REPOSITORY", "acme/app"),
            ("GITHUB_TOKEN", "fallback"),
            ("GH_TOKEN", ""),
            ("FEATURE_FREEZE", "TRUE"),
            ("FREEZE_OVERRIDE", "no"),
            ("GITHUB_JOB", "release"),
        ]
        .into_iter()
        .collect();
        let env = EnvConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(env.repository.as_deref(), Some("acme/app"));
        assert_eq!(env.token.as_deref(), Some("fallback"));
        assert_eq!(
            env.freeze(),
            FreezeConfig {
                active: true,
                override_active: false
            }
        );
        assert!(env.event_path.is_none());
    }

    #[test]
    fn self_checks_match_job_or_normalized_identifier() {
        let policy = CiPolicy::new(Some("orchestrate".to_string()), &["Deploy Gate".to_string()]);
        assert!(policy.is_self_check("orchestrate"));
        assert!(policy.is_self_check("Release-Flow / merge"));
        assert!(policy.is_self_check("release_flow"));
        assert!(policy.is_self_check("deploy-gate"));
        assert!(!policy.is_self_check("build"));
        assert!(!policy.is_self_check("release"));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".github")).unwrap();
        std::fs::write(
            dir.path().join(".github/release-flow.toml"),
            "remote = \"upstream\"\ngit_timeout_secs = 30\n\n[[stamp]]\npath = \"Cargo.toml\"\nkind = \"cargo\"\n",
        )
        .unwrap();

        let config = FlowConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.main_branch, "main");
        assert_eq!(config.git_timeout(), Duration::from_secs(30));
        assert_eq!(config.stamp[0].kind, Some(StampKind::Cargo));
    }

    #[test]
    fn missing_config_uses_defaults_and_bad_config_fails() {
        let dir = TempDir::new().unwrap();
        assert_eq!(FlowConfig::load(dir.path(), None).unwrap(), FlowConfig::default());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "remote = 3\n").unwrap();
        assert!(FlowConfig::load(dir.path(), Some(&bad)).is_err());
    }
}
