use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::{ContainerImage, DockerRunOptions};
use crate::error::{BundleError, Result};
use crate::process::{Invocation, ProcessRunner};

/// The installer image, built from a local build context.
///
/// The image is built lazily on first use and its id cached, so constructing
/// a `DockerImage` has no side effects and repeated runs build only once.
/// Any failure here is terminal: there is no tier below the container.
#[derive(Debug)]
pub struct DockerImage {
    docker: String,
    context: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    image_id: OnceLock<String>,
}

impl DockerImage {
    /// Describe an image built from `context` with the `docker` executable.
    pub fn from_build(
        docker: impl Into<String>,
        context: impl Into<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            docker: docker.into(),
            context: context.into(),
            runner,
            image_id: OnceLock::new(),
        }
    }

    /// The build context directory.
    pub fn context(&self) -> &Path {
        &self.context
    }

    /// Image id, building the image on first call.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::ContainerBundling`] if the build context is
    /// missing or `docker build` fails.
    pub fn image_id(&self) -> Result<&str> {
        if let Some(id) = self.image_id.get() {
            return Ok(id);
        }
        let id = self.build()?;
        Ok(self.image_id.get_or_init(|| id))
    }

    fn build(&self) -> Result<String> {
        if !self.context.is_dir() {
            return Err(BundleError::container(format!(
                "installer build context not found: {}",
                self.context.display()
            )));
        }

        tracing::info!("Building installer image from {}", self.context.display());
        let output = self.exec(
            Invocation::new(&self.docker)
                .args(["build", "-q"])
                .arg(self.context.to_string_lossy())
                .capture_output(),
        )?;

        // `-q` prints only the image id; take the last line in case the
        // runtime emitted warnings first.
        output
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BundleError::container("docker build printed no image id"))
    }

    /// Run `invocation`, returning captured stdout on success.
    fn exec(&self, invocation: Invocation) -> Result<String> {
        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| BundleError::container(format!("`{invocation}`: {e}")))?;
        if !output.success() {
            return Err(BundleError::container(format!(
                "`{invocation}` failed with {}",
                output.failure_summary()
            )));
        }
        Ok(output.stdout)
    }

    /// Arguments of `docker run` for `options` (after the `run` subcommand).
    fn run_args(image_id: &str, options: &DockerRunOptions) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        if let Some(user) = &options.user {
            args.extend(["-u".to_string(), user.clone()]);
        }
        for volume in &options.volumes {
            args.push("-v".to_string());
            args.push(format!(
                "{}:{}:delegated",
                volume.host_path.display(),
                volume.container_path
            ));
        }
        for (key, value) in &options.environment {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        if let Some(workdir) = &options.workdir {
            args.extend(["-w".to_string(), workdir.clone()]);
        }
        args.push(image_id.to_string());
        args.extend(options.command.iter().cloned());
        args
    }
}

impl ContainerImage for DockerImage {
    fn run(&self, options: &DockerRunOptions) -> Result<()> {
        let image_id = self.image_id()?;
        let invocation = Invocation::new(&self.docker).args(Self::run_args(image_id, options));
        tracing::info!("Running `{invocation}`");
        self.exec(invocation).map(|_| ())
    }

    fn cp(&self, image_path: &str, output_path: Option<&Path>) -> Result<PathBuf> {
        let image_id = self.image_id()?;
        // The guard drops on failure, so a failed copy leaves no directory behind.
        let (destination, scratch) = match output_path {
            Some(path) => (path.to_path_buf(), None),
            None => {
                let dir = tempfile::Builder::new().prefix("layerpack-cp-").tempdir()?;
                (dir.path().to_path_buf(), Some(dir))
            }
        };

        let container = self.exec(
            Invocation::new(&self.docker)
                .args(["create", image_id])
                .capture_output(),
        )?;
        let container = container.trim();

        let copied = self.exec(
            Invocation::new(&self.docker)
                .arg("cp")
                .arg(format!("{container}:{image_path}"))
                .arg(destination.to_string_lossy())
                .capture_output(),
        );

        // Always remove the container, even when the copy failed.
        let removed = self.exec(
            Invocation::new(&self.docker)
                .args(["rm", "-v", container])
                .capture_output(),
        );

        if let Err(e) = removed {
            tracing::warn!("Failed to remove container {container}: {e}");
        }
        copied?;
        if let Some(scratch) = scratch {
            let _ = scratch.keep();
        }
        Ok(destination)
    }
}
