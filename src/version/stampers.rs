//! Per-format version stampers.

use crate::error::{Result, StampError};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Outcome of stamping one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampResult {
    /// File that was stamped
    pub file_path: PathBuf,
    /// Stamper that handled it
    pub file_type: String,
    /// Version string written
    pub version: String,
    /// Prerelease label, if any
    pub pre_release: Option<String>,
    /// Whether the file content changed
    pub updated: bool,
}

/// Trait for writers of a version into one kind of project file
pub trait FileStamper {
    /// Short name of the handled format
    fn file_type(&self) -> &'static str;

    /// Replace the version in `content`, `None` when no version field exists
    fn rewrite(&self, content: &str, version: &str) -> std::result::Result<Option<String>, String>;

    /// Stamp `base` (plus optional `label`) into the file at `path`
    fn stamp(&self, path: &Path, base: &str, label: Option<&str>) -> Result<StampResult> {
        if !path.is_file() {
            return Err(StampError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let version = compose_version(base, label);
        let content = std::fs::read_to_string(path).map_err(|e| StampError::UpdateFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to read file: {e}"),
        })?;

        let rewritten = self
            .rewrite(&content, &version)
            .map_err(|reason| StampError::UpdateFailed {
                path: path.to_path_buf(),
                reason,
            })?
            .ok_or_else(|| StampError::FieldNotFound {
                path: path.to_path_buf(),
                file_type: self.file_type().to_string(),
            })?;

        let updated = rewritten != content;
        if updated {
            std::fs::write(path, &rewritten).map_err(|e| StampError::UpdateFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write file: {e}"),
            })?;
        }
        log::debug!("stamped {} with {version} (changed: {updated})", path.display());

        Ok(StampResult {
            file_path: path.to_path_buf(),
            file_type: self.file_type().to_string(),
            version,
            pre_release: label.map(str::to_string),
            updated,
        })
    }
}

/// `1.2.0` + `beta3` => `1.2.0-beta3`
pub fn compose_version(base: &str, label: Option<&str>) -> String {
    let base = base.strip_prefix('v').unwrap_or(base);
    match label {
        Some(label) if !label.is_empty() => format!("{base}-{label}"),
        _ => base.to_string(),
    }
}

/// `[package] version` in a Cargo manifest, or `[workspace.package] version`
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoTomlStamper;

impl FileStamper for CargoTomlStamper {
    fn file_type(&self) -> &'static str {
        "cargo"
    }

    fn rewrite(&self, content: &str, version: &str) -> std::result::Result<Option<String>, String> {
        let mut doc = content
            .parse::<toml_edit::DocumentMut>()
            .map_err(|e| format!("Failed to parse TOML: {e}"))?;

        let has_package_version = doc
            .get("package")
            .and_then(|p| p.get("version"))
            .is_some_and(|v| v.is_str());
        let has_workspace_version = doc
            .get("workspace")
            .and_then(|w| w.get("package"))
            .and_then(|p| p.get("version"))
            .is_some_and(|v| v.is_str());

        if has_package_version {
            doc["package"]["version"] = toml_edit::value(version);
        } else if has_workspace_version {
            doc["workspace"]["package"]["version"] = toml_edit::value(version);
        } else {
            return Ok(None);
        }
        Ok(Some(doc.to_string()))
    }
}

fn json_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"("version"\s*:\s*)"[^"]*""#).expect("valid regex"))
}

/// Top-level `"version"` of a JSON manifest such as `package.json`.
///
/// The value is replaced textually so key order and indentation survive;
/// `"version"` keys inside nested objects are left alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManifestStamper;

impl FileStamper for JsonManifestStamper {
    fn file_type(&self) -> &'static str {
        "json"
    }

    fn rewrite(&self, content: &str, version: &str) -> std::result::Result<Option<String>, String> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| format!("Failed to parse JSON: {e}"))?;
        if !value.get("version").is_some_and(|v| v.is_string()) {
            return Ok(None);
        }

        let field = json_version_pattern()
            .captures_iter(content)
            .filter_map(|caps| caps.get(0).zip(caps.get(1)))
            .find(|(whole, _)| nesting_depth(content, whole.start()) == 1)
            .ok_or_else(|| "top-level \"version\" field not found in source text".to_string())?;
        let (whole, key) = field;

        let mut out = String::with_capacity(content.len() + version.len());
        out.push_str(&content[..key.end()]);
        out.push('"');
        out.push_str(version);
        out.push('"');
        out.push_str(&content[whole.end()..]);

        let stamped: serde_json::Value =
            serde_json::from_str(&out).map_err(|e| format!("Stamped JSON is invalid: {e}"))?;
        if stamped.get("version").and_then(|v| v.as_str()) != Some(version) {
            return Err("top-level \"version\" was not updated".to_string());
        }
        Ok(Some(out))
    }
}

/// Object/array nesting depth at byte `offset`, ignoring brackets inside strings
fn nesting_depth(content: &str, offset: usize) -> usize {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in content[..offset].chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

fn xml_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(<Version>)[^<]*(</Version>)").expect("valid regex"))
}

/// `<Version>` element of an MSBuild-style project file
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlVersionStamper;

impl FileStamper for XmlVersionStamper {
    fn file_type(&self) -> &'static str {
        "xml"
    }

    fn rewrite(&self, content: &str, version: &str) -> std::result::Result<Option<String>, String> {
        if !xml_version_pattern().is_match(content) {
            return Ok(None);
        }
        let replacement = format!("${{1}}{version}${{2}}");
        Ok(Some(
            xml_version_pattern()
                .replace(content, replacement.as_str())
                .into_owned(),
        ))
    }
}

/// A file whose whole content is the version, e.g. `VERSION`
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextStamper;

impl FileStamper for PlainTextStamper {
    fn file_type(&self) -> &'static str {
        "text"
    }

    fn rewrite(&self, content: &str, version: &str) -> std::result::Result<Option<String>, String> {
        let trailing_newline = content.ends_with('\n') || content.is_empty();
        let mut out = version.to_string();
        if trailing_newline {
            out.push('\n');
        }
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn cargo_manifest_keeps_formatting() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Cargo.toml",
            "[package]\nname = \"app\" # the app\nversion = \"0.9.0\"\n\n[dependencies]\nserde = \"1\"\n",
        );

        let result = CargoTomlStamper.stamp(&path, "1.0.0", Some("beta2")).unwrap();
        assert!(result.updated);
        assert_eq!(result.version, "1.0.0-beta2");
        assert_eq!(result.pre_release.as_deref(), Some("beta2"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("version = \"1.0.0-beta2\""));
        assert!(content.contains("# the app"));
        assert!(content.contains("serde = \"1\""));
    }

    #[test]
    fn cargo_workspace_version_is_stamped() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Cargo.toml", "[workspace.package]\nversion = \"0.1.0\"\n");
        CargoTomlStamper.stamp(&path, "v2.0.0", None).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("version = \"2.0.0\""));
    }

    #[test]
    fn json_manifest_replaces_version_only() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "package.json",
            "{\n  \"name\": \"app\",\n  \"version\": \"0.1.0\",\n  \"private\": true\n}\n",
        );
        JsonManifestStamper.stamp(&path, "1.2.0", Some("alpha1")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"app\",\n  \"version\": \"1.2.0-alpha1\",\n  \"private\": true\n}\n"
        );
    }

    #[test]
    fn json_manifest_skips_nested_version_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "package.json",
            "{\"name\":\"app\",\"engines\":{\"version\":\"18\"},\"note\":\"{\\\"version\\\": 1\",\"version\":\"0.1.0\"}",
        );
        let result = JsonManifestStamper.stamp(&path, "1.2.0", Some("alpha1")).unwrap();
        assert!(result.updated);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["version"], "1.2.0-alpha1");
        assert_eq!(value["engines"]["version"], "18");
        assert_eq!(value["note"], "{\"version\": 1");
    }

    #[test]
    fn xml_and_text_files() {
        let dir = TempDir::new().unwrap();
        let csproj = write(
            &dir,
            "App.csproj",
            "<Project><PropertyGroup><Version>0.1.0</Version></PropertyGroup></Project>",
        );
        let version = write(&dir, "VERSION", "0.1.0\n");

        XmlVersionStamper.stamp(&csproj, "1.0.0", None).unwrap();
        PlainTextStamper.stamp(&version, "1.0.0", None).unwrap();

        assert!(std::fs::read_to_string(&csproj).unwrap().contains("<Version>1.0.0</Version>"));
        assert_eq!(std::fs::read_to_string(&version).unwrap(), "1.0.0\n");
    }

    #[test]
    fn unchanged_file_reports_not_updated() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "VERSION", "1.0.0\n");
        let result = PlainTextStamper.stamp(&path, "1.0.0", None).unwrap();
        assert!(!result.updated);
    }

    #[test]
    fn missing_file_and_missing_field_are_distinct() {
        let dir = TempDir::new().unwrap();
        let missing = CargoTomlStamper
            .stamp(&dir.path().join("Cargo.toml"), "1.0.0", None)
            .unwrap_err();
        assert!(matches!(
            missing,
            crate::error::ReleaseError::Stamp(StampError::FileNotFound { .. })
        ));

        let path = write(&dir, "Cargo.toml", "[workspace]\nmembers = []\n");
        let no_field = CargoTomlStamper.stamp(&path, "1.0.0", None).unwrap_err();
        assert!(matches!(
            no_field,
            crate::error::ReleaseError::Stamp(StampError::FieldNotFound { .. })
        ));
    }
}
