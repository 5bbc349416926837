//! Branch-naming contract.
//!
//! All knowledge about `dev/vX.Y.Z`, `release/vX.Y.Z`, `feature/*`, `fix/*` and
//! the main branch lives here. Guardrails and the resolver work on the
//! classified [`BranchKind`] instead of re-matching strings.

use regex::Regex;
use semver::Version;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// Prefix for development branches of a release train
pub const DEV_PREFIX: &str = "dev/";
/// Prefix for stabilization branches
pub const RELEASE_PREFIX: &str = "release/";

fn dev_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^dev/v(\d+)\.(\d+)\.(\d+)$").expect("valid regex"))
}

fn release_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^release/v(\d+)\.(\d+)\.(\d+)$").expect("valid regex"))
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid regex"))
}

/// A `MAJOR.MINOR.PATCH` version, always rendered with the `v` marker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion(Version);

impl ReleaseVersion {
    /// Build from numeric components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse `X.Y.Z` or `vX.Y.Z`. Prerelease and build metadata are rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let bare = input.trim().strip_prefix('v').unwrap_or(input.trim());
        let version = Version::parse(bare).ok()?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return None;
        }
        Some(Self(version))
    }

    /// Find the first `X.Y.Z` occurrence inside arbitrary text
    pub fn find_in(text: &str) -> Option<Self> {
        let caps = version_pattern().captures(text)?;
        from_captures(&caps)
    }

    /// Tag form, e.g. `v1.2.0`
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }

    /// Version without the marker, e.g. `1.2.0`
    pub fn bare(&self) -> String {
        self.0.to_string()
    }

    /// Underlying semver value
    pub fn semver(&self) -> &Version {
        &self.0
    }

    /// Development branch of this train, e.g. `dev/v1.2.0`
    pub fn dev_branch(&self) -> String {
        format!("{DEV_PREFIX}{}", self.tag())
    }

    /// Stabilization branch of this train, e.g. `release/v1.2.0`
    pub fn release_branch(&self) -> String {
        format!("{RELEASE_PREFIX}{}", self.tag())
    }

    /// Movable alias tags: `vMAJOR` and `vMAJOR.MINOR`
    pub fn smart_tags(&self) -> [String; 2] {
        [
            format!("v{}", self.0.major),
            format!("v{}.{}", self.0.major, self.0.minor),
        ]
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl Serialize for ReleaseVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

fn from_captures(caps: &regex::Captures<'_>) -> Option<ReleaseVersion> {
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps.get(3)?.as_str().parse().ok()?;
    Some(ReleaseVersion::new(major, minor, patch))
}

/// Closed set of branch roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchKind {
    /// `feature/*`
    Feature,
    /// `fix/*` or `hotfix/*`
    Fix,
    /// `dev/vX.Y.Z`
    Dev(ReleaseVersion),
    /// `release/vX.Y.Z`
    Release(ReleaseVersion),
    /// `main` or `master`
    Main,
    /// Anything else
    Unknown,
}

impl BranchKind {
    /// Whether this is a feature branch
    pub fn is_feature(&self) -> bool {
        matches!(self, BranchKind::Feature)
    }

    /// Whether this is a fix or hotfix branch
    pub fn is_fix(&self) -> bool {
        matches!(self, BranchKind::Fix)
    }
}

/// Classify a branch name (a leading `refs/heads/` is ignored)
pub fn classify(branch: &str) -> BranchKind {
    let name = branch.strip_prefix("refs/heads/").unwrap_or(branch);

    if let Some(caps) = dev_pattern().captures(name)
        && let Some(version) = from_captures(&caps)
    {
        return BranchKind::Dev(version);
    }
    if let Some(caps) = release_pattern().captures(name)
        && let Some(version) = from_captures(&caps)
    {
        return BranchKind::Release(version);
    }

    match name {
        "main" | "master" => BranchKind::Main,
        _ if name.starts_with("feature/") => BranchKind::Feature,
        _ if name.starts_with("fix/") || name.starts_with("hotfix/") => BranchKind::Fix,
        _ => BranchKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_train_branches() {
        assert_eq!(classify("dev/v1.2.0"), BranchKind::Dev(ReleaseVersion::new(1, 2, 0)));
        assert_eq!(
            classify("release/v10.0.3"),
            BranchKind::Release(ReleaseVersion::new(10, 0, 3))
        );
        assert_eq!(classify("refs/heads/dev/v0.1.0"), BranchKind::Dev(ReleaseVersion::new(0, 1, 0)));
    }

    #[test]
    fn train_patterns_are_exact() {
        assert_eq!(classify("dev/1.2.0"), BranchKind::Unknown);
        assert_eq!(classify("dev/v1.2.0-rc"), BranchKind::Unknown);
        assert_eq!(classify("release/v1.2"), BranchKind::Unknown);
        assert_eq!(classify("xdev/v1.2.0"), BranchKind::Unknown);
    }

    #[test]
    fn classifies_work_branches() {
        assert_eq!(classify("main"), BranchKind::Main);
        assert_eq!(classify("master"), BranchKind::Main);
        assert!(classify("feature/login").is_feature());
        assert!(classify("fix/crash").is_fix());
        assert!(classify("hotfix/crash").is_fix());
        assert_eq!(classify("chore/deps"), BranchKind::Unknown);
        assert_eq!(classify("mainline"), BranchKind::Unknown);
    }

    #[test]
    fn versions_are_normalized_with_marker() {
        let v = ReleaseVersion::parse("1.2.0").unwrap();
        assert_eq!(v.tag(), "v1.2.0");
        assert_eq!(ReleaseVersion::parse("v1.2.0"), Some(v.clone()));
        assert_eq!(v.to_string(), "v1.2.0");
        assert_eq!(v.dev_branch(), "dev/v1.2.0");
        assert_eq!(v.release_branch(), "release/v1.2.0");
        assert_eq!(v.smart_tags(), ["v1".to_string(), "v1.2".to_string()]);
        assert!(ReleaseVersion::parse("1.2.0-beta.1").is_none());
        assert!(ReleaseVersion::parse("1.2").is_none());
    }

    #[test]
    fn finds_version_inside_branch_names() {
        assert_eq!(
            ReleaseVersion::find_in("feature/port-to-3.1.4-api"),
            Some(ReleaseVersion::new(3, 1, 4))
        );
        assert_eq!(ReleaseVersion::find_in("fix/typo"), None);
    }
}
