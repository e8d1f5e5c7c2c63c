//! Dependency manifest parsing.
//!
//! Only the fields the packager needs are read from `package.json`: the
//! package identity and its production dependencies. Everything else in the
//! file is ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BundleError, Result};

/// The subset of a `package.json` manifest read by the packager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Declared package name, if any.
    #[serde(default)]
    pub name: Option<String>,
    /// Declared package version, if any.
    #[serde(default)]
    pub version: Option<String>,
    /// Production dependencies: name to version requirement.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Parse a manifest from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Manifest`] if the text is not a JSON object
    /// matching the manifest schema. `path` is only used for the message.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| BundleError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load and parse a manifest from the given file path.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Manifest`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BundleError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Version string for display, `0.0.0` when undeclared.
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or("0.0.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "my-layer",
                "version": "1.2.3",
                "scripts": { "build": "tsc" },
                "dependencies": { "left-pad": "^1.3.0" },
                "devDependencies": { "typescript": "^5" }
            }"#,
            Path::new("package.json"),
        )
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("my-layer"));
        assert_eq!(manifest.version_or_default(), "1.2.3");
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies["left-pad"], "^1.3.0");
    }

    #[test]
    fn test_parse_minimal() {
        let manifest = PackageManifest::parse("{}", Path::new("package.json")).unwrap();
        assert_eq!(manifest, PackageManifest::default());
        assert_eq!(manifest.version_or_default(), "0.0.0");
    }

    #[test]
    fn test_load_reports_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("package.json");
        std::fs::write(&path, "not json").unwrap();

        let err = PackageManifest::load(&path).unwrap_err();
        assert!(matches!(err, BundleError::Manifest { .. }));
        assert!(err.to_string().contains("package.json"));
    }
}
