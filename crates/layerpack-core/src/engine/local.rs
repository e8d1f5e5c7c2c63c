use std::path::{Path, PathBuf};
use std::sync::Arc;

use layerpack_schema::MANIFEST_FILE;

use super::MODULES_FOLDER;
use crate::error::{BundleError, Result};
use crate::process::{Invocation, ProcessRunner};

/// Installs production dependencies with the host's package manager.
///
/// [`try_bundle`](Self::try_bundle) never returns an error: every failure is
/// logged and reported as `false`, which the stager treats as the signal to
/// move on to the container slot.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    package_root: PathBuf,
    package_manager: String,
    runner: Arc<dyn ProcessRunner>,
}

impl LocalEngine {
    /// Create an engine for the package at `package_root`.
    pub fn new(
        package_root: impl Into<PathBuf>,
        package_manager: impl Into<String>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            package_root: package_root.into(),
            package_manager: package_manager.into(),
            runner,
        }
    }

    /// Root of the package whose manifest is installed.
    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// The install command run inside `output_dir`.
    pub fn install_invocation(&self, output_dir: &Path) -> Invocation {
        Invocation::new(&self.package_manager)
            .args(["install", "--modules-folder", MODULES_FOLDER, "--production"])
            .current_dir(output_dir)
    }

    /// Bundle into `output_dir`, returning whether it succeeded.
    pub fn try_bundle(&self, output_dir: &Path) -> bool {
        match self.bundle(output_dir) {
            Ok(()) => {
                tracing::info!("Installed dependencies locally into {}", output_dir.display());
                true
            }
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    }

    fn bundle(&self, output_dir: &Path) -> Result<()> {
        let source = self.package_root.join(MANIFEST_FILE);
        std::fs::copy(&source, output_dir.join(MANIFEST_FILE)).map_err(|e| {
            BundleError::LocalBundling {
                message: format!("copying {}: {e}", source.display()),
            }
        })?;

        let invocation = self.install_invocation(output_dir);
        tracing::info!("Running `{invocation}`");
        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| BundleError::LocalBundling {
                message: format!("`{invocation}`: {e}"),
            })?;

        if !output.success() {
            return Err(BundleError::LocalBundling {
                message: format!("`{invocation}` failed with {}", output.failure_summary()),
            });
        }
        Ok(())
    }
}
