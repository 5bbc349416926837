//! Prerelease identifiers and sequence numbering.

use crate::branch::ReleaseVersion;
use serde::Serialize;
use std::fmt;

/// Prerelease channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrereleaseKind {
    /// Integration builds from `dev/*`
    Alpha,
    /// Stabilization builds from `release/*`
    Beta,
}

impl PrereleaseKind {
    /// Lowercase label, e.g. `alpha`
    pub fn as_str(&self) -> &'static str {
        match self {
            PrereleaseKind::Alpha => "alpha",
            PrereleaseKind::Beta => "beta",
        }
    }
}

impl fmt::Display for PrereleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical prerelease: channel plus sequence number.
///
/// Tags use the dotted form (`alpha.1`). Project files receive the undotted
/// form (`alpha1`) because some package manifests reject dots in prerelease
/// identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerelease {
    /// Channel
    pub kind: PrereleaseKind,
    /// 1-based sequence number
    pub number: u64,
}

impl Prerelease {
    /// Dotted tag suffix, e.g. `beta.2`
    pub fn tag_suffix(&self) -> String {
        format!("{}.{}", self.kind, self.number)
    }

    /// Undotted label for file stamping, e.g. `beta2`
    pub fn stamp_label(&self) -> String {
        format!("{}{}", self.kind, self.number)
    }

    /// Full tag for a version, e.g. `v1.0.0-beta.2`
    pub fn tag_for(&self, version: &ReleaseVersion) -> String {
        format!("{}-{}", version.tag(), self.tag_suffix())
    }
}

/// Glob matching every prerelease tag of a channel
pub fn tag_glob(version: &ReleaseVersion, kind: PrereleaseKind) -> String {
    format!("{}-{}*", version.tag(), kind)
}

/// Parse the sequence number of a prerelease tag.
///
/// Accepts `v1.0.0-beta.3` and `v1.0.0-beta3`; anything else is `None`.
pub fn parse_sequence(tag: &str, version: &ReleaseVersion, kind: PrereleaseKind) -> Option<u64> {
    let prefix = format!("{}-{}", version.tag(), kind);
    let rest = tag.strip_prefix(&prefix)?;
    let digits = rest.strip_prefix('.').unwrap_or(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next free sequence number given the existing tags: max + 1, or 1
pub fn next_sequence<S: AsRef<str>>(tags: &[S], version: &ReleaseVersion, kind: PrereleaseKind) -> u64 {
    tags.iter()
        .filter_map(|tag| parse_sequence(tag.as_ref(), version, kind))
        .max()
        .map_or(1, |max| max + 1)
}
