//! Asset staging.
//!
//! Turns an [`EngineSelection`] into a staged asset directory:
//!
//! 1. Fingerprint the package's manifest inputs.
//! 2. Bundle into a fresh scratch directory next to the final location,
//!    trying the local slot first and the container slot when the local
//!    engine is absent or fails. The scratch directory is emptied between
//!    the two attempts so a half-finished local install never leaks into the
//!    container output.
//! 3. Promote the scratch directory to `asset.<fingerprint>`.
//!
//! Any terminal failure discards the scratch directory, so an
//! `asset.<fingerprint>` directory only ever holds a complete bundle. A
//! previously staged asset is set aside during promotion and restored if the
//! new one cannot be put in place.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use layerpack_schema::{Fingerprint, LOCKFILE};

use crate::engine::{
    ASSET_INPUT_DIR, ASSET_OUTPUT_DIR, ContainerImage, DockerRunOptions, EngineSelection,
    INSTALL_COMMAND, Volume,
};
use crate::error::{BundleError, Result};
use crate::locator::ResolvedPackage;
use crate::paths::{BuildOutput, Stage};

/// Which slot produced a staged asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagedBy {
    /// The local package manager.
    Local,
    /// The installer container.
    Container,
}

impl std::fmt::Display for StagedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Container => write!(f, "container"),
        }
    }
}

/// A completed, staged asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    /// Fingerprint naming the asset directory.
    pub fingerprint: Fingerprint,
    /// Output directory as reported to the caller.
    pub output: BuildOutput,
    /// The slot that produced it.
    pub staged_by: StagedBy,
}

/// Stages assets under an output directory.
#[derive(Debug, Clone)]
pub struct AssetStager {
    outdir: PathBuf,
    report_relative: bool,
}

impl AssetStager {
    /// Stage under the stage's asset outdir and report paths relative to it.
    pub fn for_stage(stage: &Stage) -> Self {
        Self {
            outdir: stage.asset_outdir.clone(),
            report_relative: true,
        }
    }

    /// Stage outside any stage, under the system temp directory, and report
    /// absolute paths.
    pub fn unstaged() -> Self {
        Self {
            outdir: std::env::temp_dir().join("layerpack"),
            report_relative: false,
        }
    }

    /// Directory assets are staged under.
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Bundle `package` with `selection` and stage the result.
    ///
    /// # Errors
    ///
    /// Returns the container slot's error when the local engine is absent or
    /// failed and the container slot failed too, or an IO error if the
    /// scratch directory cannot be created or promoted.
    pub fn stage(
        &self,
        package: &ResolvedPackage,
        selection: &EngineSelection,
    ) -> Result<StagedAsset> {
        let fingerprint = fingerprint(package)?;
        std::fs::create_dir_all(&self.outdir)?;

        let scratch = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.outdir)?;

        let staged_by = bundle_into(package, selection, scratch.path())?;

        let dir_name = fingerprint.asset_dir_name();
        let target = self.outdir.join(&dir_name);
        promote(scratch, &target)?;
        tracing::info!(
            "Staged {} ({staged_by}) at {}",
            package.name(),
            target.display()
        );

        let output_directory = if self.report_relative {
            PathBuf::from(dir_name)
        } else {
            target
        };
        Ok(StagedAsset {
            fingerprint,
            output: BuildOutput { output_directory },
            staged_by,
        })
    }
}

/// Try the local slot, then the container slot, bundling into `scratch`.
fn bundle_into(
    package: &ResolvedPackage,
    selection: &EngineSelection,
    scratch: &Path,
) -> Result<StagedBy> {
    if let Some(local) = &selection.local {
        if local.try_bundle(scratch) {
            return Ok(StagedBy::Local);
        }
        if selection.container.is_available() {
            tracing::warn!("Local bundling failed, falling back to container bundling");
        } else {
            tracing::warn!("Local bundling failed and container bundling is disabled");
        }
        clear_dir(scratch)?;
    }

    selection
        .container
        .run(&container_options(package.root_directory(), scratch))?;
    Ok(StagedBy::Container)
}

/// Run options for the installer container bundling `package_root` into
/// `output_dir`.
pub fn container_options(package_root: &Path, output_dir: &Path) -> DockerRunOptions {
    DockerRunOptions {
        command: vec![INSTALL_COMMAND.to_string()],
        volumes: vec![
            Volume {
                host_path: package_root.to_path_buf(),
                container_path: ASSET_INPUT_DIR.to_string(),
            },
            Volume {
                host_path: output_dir.to_path_buf(),
                container_path: ASSET_OUTPUT_DIR.to_string(),
            },
        ],
        workdir: Some(ASSET_INPUT_DIR.to_string()),
        user: owner_of(output_dir),
        environment: std::collections::BTreeMap::new(),
    }
}

/// Fingerprint of a package's manifest inputs: `package.json` plus the
/// lockfile when one exists.
///
/// # Errors
///
/// Returns an IO error if an input file exists but cannot be read.
pub fn fingerprint(package: &ResolvedPackage) -> Result<Fingerprint> {
    let mut hasher = Sha256::new();
    hasher.update(std::fs::read(package.manifest_path())?);

    let lockfile = package.root_directory().join(LOCKFILE);
    if lockfile.is_file() {
        hasher.update([0u8]);
        hasher.update(std::fs::read(lockfile)?);
    }

    Fingerprint::validated(&hex::encode(hasher.finalize())).map_err(|message| {
        BundleError::Manifest {
            path: package.manifest_path(),
            message,
        }
    })
}

#[cfg(unix)]
fn owner_of(path: &Path) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    let meta = std::fs::metadata(path).ok()?;
    Some(format!("{}:{}", meta.uid(), meta.gid()))
}

#[cfg(not(unix))]
fn owner_of(_path: &Path) -> Option<String> {
    None
}

fn clear_dir(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Move a finished scratch directory to `target`, replacing what was there.
///
/// Prefers rename (atomic on the same filesystem) with a copy fallback.
fn promote(scratch: TempDir, target: &Path) -> Result<()> {
    replace_dir(target, |target| {
        if std::fs::rename(scratch.path(), target).is_ok() {
            let _ = scratch.keep();
            return Ok(());
        }
        copy_dir_all(scratch.path(), target)
    })
}

/// Put a new `target` in place with `install`.
///
/// An existing `target` is moved into a sibling `.previous-*` directory first
/// and only deleted once `install` succeeded. On failure the partial output
/// is removed and the previous directory restored.
fn replace_dir(target: &Path, install: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    const SET_ASIDE: &str = "asset";

    let previous = if target.exists() {
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let holder = tempfile::Builder::new()
            .prefix(".previous-")
            .tempdir_in(parent)?;
        std::fs::rename(target, holder.path().join(SET_ASIDE))?;
        Some(holder)
    } else {
        None
    };

    let Err(e) = install(target) else {
        return Ok(());
    };

    let cleanup = if target.exists() {
        std::fs::remove_dir_all(target)
    } else {
        Ok(())
    };
    if let Err(cleanup) = cleanup {
        tracing::warn!("Failed to remove partial {}: {cleanup}", target.display());
    }
    if let Some(holder) = previous {
        let saved = holder.path().join(SET_ASIDE);
        if let Err(restore) = std::fs::rename(&saved, target) {
            tracing::warn!(
                "Failed to restore {}: {restore}; previous asset left at {}",
                target.display(),
                saved.display()
            );
            let _ = holder.keep();
        }
    }
    Err(e)
}

/// Recursively copy a directory tree from `src` to `dst`.
///
/// # Errors
///
/// Returns an error if any file or directory cannot be copied.
pub fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(dst.as_ref())?;
    fs_extra::dir::copy(
        src,
        dst,
        &fs_extra::dir::CopyOptions::new()
            .content_only(true)
            .overwrite(true),
    )
    .map_err(|e| std::io::Error::other(format!("Copy failed: {e}")))?;
    Ok(())
}
