//! Version stamping of project files.
//!
//! A [`VersionStamper`] writes the release version (optionally with a
//! prerelease label such as `beta3`) into every configured project file,
//! dispatching to the [`FileStamper`] for the file's format.

mod stampers;

pub use stampers::{
    CargoTomlStamper, FileStamper, JsonManifestStamper, PlainTextStamper, StampResult,
    XmlVersionStamper, compose_version,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported project-file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampKind {
    /// `Cargo.toml`
    Cargo,
    /// `package.json` and friends
    Json,
    /// MSBuild `<Version>`
    Xml,
    /// Bare version file
    Text,
}

impl StampKind {
    /// Guess the format from a file name
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        match name {
            "Cargo.toml" => Some(StampKind::Cargo),
            "VERSION" | "version.txt" => Some(StampKind::Text),
            _ => match path.extension()?.to_str()? {
                "json" => Some(StampKind::Json),
                "csproj" | "fsproj" | "vbproj" | "props" => Some(StampKind::Xml),
                _ => None,
            },
        }
    }

    fn stamp(&self, path: &Path, base: &str, label: Option<&str>) -> Result<StampResult> {
        match self {
            StampKind::Cargo => CargoTomlStamper.stamp(path, base, label),
            StampKind::Json => JsonManifestStamper.stamp(path, base, label),
            StampKind::Xml => XmlVersionStamper.stamp(path, base, label),
            StampKind::Text => PlainTextStamper.stamp(path, base, label),
        }
    }
}

/// A file to stamp, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampTarget {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// Format; detected from the file name when omitted
    #[serde(default)]
    pub kind: Option<StampKind>,
}

/// Files tried when no targets are configured
const DEFAULT_CANDIDATES: [&str; 3] = ["Cargo.toml", "package.json", "VERSION"];

/// Stamps all configured files in a repository
#[derive(Debug, Clone)]
pub struct VersionStamper {
    root: PathBuf,
    targets: Vec<StampTarget>,
}

impl VersionStamper {
    /// Create a stamper for `root`.
    ///
    /// With an empty target list, whichever of `Cargo.toml`, `package.json`
    /// and `VERSION` exist at the root are stamped.
    pub fn new(root: impl Into<PathBuf>, targets: Vec<StampTarget>) -> Self {
        let root = root.into();
        let targets = if targets.is_empty() {
            DEFAULT_CANDIDATES
                .iter()
                .filter(|name| root.join(name).is_file())
                .map(|name| StampTarget {
                    path: PathBuf::from(name),
                    kind: None,
                })
                .collect()
        } else {
            targets
        };
        Self { root, targets }
    }

    /// Absolute paths of every target
    pub fn paths(&self) -> Vec<PathBuf> {
        self.targets.iter().map(|t| self.root.join(&t.path)).collect()
    }

    /// Stamp every target; the first failure aborts
    pub fn stamp_all(&self, base: &str, label: Option<&str>) -> Result<Vec<StampResult>> {
        if self.targets.is_empty() {
            log::warn!("no version files found under {}, nothing stamped", self.root.display());
        }

        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let path = self.root.join(&target.path);
            let kind = target
                .kind
                .or_else(|| StampKind::detect(&path))
                .unwrap_or(StampKind::Text);
            results.push(kind.stamp(&path, base, label)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_formats_from_file_names() {
        assert_eq!(StampKind::detect(Path::new("Cargo.toml")), Some(StampKind::Cargo));
        assert_eq!(StampKind::detect(Path::new("web/package.json")), Some(StampKind::Json));
        assert_eq!(StampKind::detect(Path::new("src/App.csproj")), Some(StampKind::Xml));
        assert_eq!(StampKind::detect(Path::new("VERSION")), Some(StampKind::Text));
        assert_eq!(StampKind::detect(Path::new("README.md")), None);
    }

    #[test]
    fn stamps_default_files_when_unconfigured() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("VERSION"), "0.0.1\n").unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"x\"\nversion = \"0.0.1\"\n",
        )
        .unwrap();

        let stamper = VersionStamper::new(dir.path(), Vec::new());
        let results = stamper.stamp_all("1.0.0", Some("alpha1")).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.version == "1.0.0-alpha1"));
    }

    #[test]
    fn configured_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let stamper = VersionStamper::new(
            dir.path(),
            vec![StampTarget {
                path: PathBuf::from("app/Cargo.toml"),
                kind: Some(StampKind::Cargo),
            }],
        );
        assert!(stamper.stamp_all("1.0.0", None).is_err());
    }
}
