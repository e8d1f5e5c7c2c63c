//! Artifact path resolution.
//!
//! A staged asset reports its output directory either as an absolute path or
//! relative to the staging root of the enclosing stage. Everything after the
//! stager wants an absolute path, so it goes through [`resolve`].

use std::path::{Path, PathBuf};

/// The enclosing deployment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Directory the stage stages its assets under.
    pub asset_outdir: PathBuf,
}

impl Stage {
    /// A stage staging into `asset_outdir`.
    pub fn new(asset_outdir: impl Into<PathBuf>) -> Self {
        Self {
            asset_outdir: asset_outdir.into(),
        }
    }
}

/// Output directory exactly as the engine/stager reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// May be absolute, or relative to the staging root.
    pub output_directory: PathBuf,
}

/// Absolute artifact directory handed to the registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifactPath {
    /// The resolved path.
    pub absolute_path: PathBuf,
}

impl AsRef<Path> for ResolvedArtifactPath {
    fn as_ref(&self) -> &Path {
        &self.absolute_path
    }
}

/// Staging root of `stage`, or the empty path when there is no stage.
pub fn staging_root_of(stage: Option<&Stage>) -> PathBuf {
    stage.map(|s| s.asset_outdir.clone()).unwrap_or_default()
}

/// Resolve a reported output path against the staging root.
///
/// Absolute paths are returned unchanged. Relative paths are joined onto
/// `staging_root`; with an empty staging root the result stays relative to
/// the working directory, so production callers must supply a stage.
pub fn resolve(reported: &Path, staging_root: &Path) -> ResolvedArtifactPath {
    let absolute_path = if reported.is_absolute() {
        reported.to_path_buf()
    } else {
        staging_root.join(reported)
    };
    tracing::debug!(
        "Resolved artifact {} -> {}",
        reported.display(),
        absolute_path.display()
    );
    ResolvedArtifactPath { absolute_path }
}

/// [`resolve`] for a [`BuildOutput`] inside an optional stage.
pub fn resolve_output(output: &BuildOutput, stage: Option<&Stage>) -> ResolvedArtifactPath {
    resolve(&output.output_directory, &staging_root_of(stage))
}
