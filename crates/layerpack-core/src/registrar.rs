//! Layer registration.
//!
//! The last step of a packaging request: turn a resolved artifact directory
//! into a layer version. The shipped [`ManifestRegistrar`] records layer
//! versions in a `layers.json` file next to the staged assets, keyed by
//! package name, for the deployment tooling to pick up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use layerpack_schema::{BundleMode, Fingerprint, PackageName};

use crate::error::{BundleError, Result};
use crate::paths::ResolvedArtifactPath;
use crate::stager::StagedBy;

/// File name of the layer manifest.
pub const LAYER_MANIFEST_FILE: &str = "layers.json";

/// Everything known about a finished bundle.
#[derive(Debug, Clone, Copy)]
pub struct LayerRequest<'a> {
    /// Package the layer is built from.
    pub package: &'a PackageName,
    /// Declared package version.
    pub version: &'a str,
    /// Absolute artifact directory.
    pub artifact: &'a ResolvedArtifactPath,
    /// Mode the request ran with.
    pub bundle_mode: BundleMode,
    /// Fingerprint of the manifest inputs.
    pub fingerprint: &'a Fingerprint,
    /// Which slot produced the artifact.
    pub staged_by: StagedBy,
}

/// A registered layer version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerVersion {
    /// Package the layer is built from.
    pub package: PackageName,
    /// Declared package version.
    pub version: String,
    /// Absolute directory holding the layer contents.
    pub code_path: PathBuf,
    /// Mode the layer was bundled with.
    pub bundle_mode: BundleMode,
    /// Fingerprint of the manifest inputs.
    pub fingerprint: Fingerprint,
    /// Which slot produced the layer.
    pub staged_by: StagedBy,
}

/// Turns resolved artifacts into layer versions.
pub trait LayerRegistrar: std::fmt::Debug {
    /// Register the artifact described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration cannot be recorded.
    fn register(&self, request: &LayerRequest<'_>) -> Result<LayerVersion>;
}

/// On-disk layer manifest: package name to its latest layer version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerManifest {
    /// Registered layers.
    pub layers: BTreeMap<String, LayerVersion>,
}

impl LayerManifest {
    /// Load a layer manifest, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| BundleError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Atomically persist the manifest to `path`.
    ///
    /// Written to a temporary file first and renamed, so readers never see a
    /// partially written manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing, or the rename fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

/// Records layer versions in `<dir>/layers.json`.
#[derive(Debug, Clone)]
pub struct ManifestRegistrar {
    path: PathBuf,
}

impl ManifestRegistrar {
    /// Registrar writing into `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LAYER_MANIFEST_FILE),
        }
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayerRegistrar for ManifestRegistrar {
    fn register(&self, request: &LayerRequest<'_>) -> Result<LayerVersion> {
        let layer = LayerVersion {
            package: request.package.clone(),
            version: request.version.to_string(),
            code_path: request.artifact.absolute_path.clone(),
            bundle_mode: request.bundle_mode,
            fingerprint: request.fingerprint.clone(),
            staged_by: request.staged_by,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut manifest = LayerManifest::load(&self.path)?;
        manifest
            .layers
            .insert(request.package.to_string(), layer.clone());
        manifest.save(&self.path)?;

        tracing::info!(
            "Registered layer {}@{} in {}",
            layer.package,
            layer.version,
            self.path.display()
        );
        Ok(layer)
    }
}
