//! Bundling engines.
//!
//! Three variants produce (or refuse to produce) a directory of installed
//! dependencies:
//!
//! | Engine | Slot | Behaviour |
//! |---|---|---|
//! | [`LocalEngine`] | local | copies `package.json`, runs the package manager; `false` on failure |
//! | [`DockerImage`] | container | builds the installer image once, runs `/usr/bin/install.sh` |
//! | [`UnavailableImage`] | container | fails every operation with its diagnostic |
//!
//! Engines are chosen once, by the selector, and handed to the stager as an
//! [`EngineSelection`]. Nothing downstream branches on the bundle mode again.

mod docker;
mod local;
mod unavailable;

pub use docker::DockerImage;
pub use local::LocalEngine;
pub use unavailable::UnavailableImage;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::process::{ProcessRunner, SystemRunner};

/// Entry command of the installer image.
pub const INSTALL_COMMAND: &str = "/usr/bin/install.sh";

/// Where installed modules land below the output directory.
pub const MODULES_FOLDER: &str = "nodejs/node_modules";

/// Diagnostic of the container slot when container bundling is disabled.
pub const DOCKER_DISABLED_MESSAGE: &str =
    "docker bundling disabled; local bundling must have failed";

/// Mount point of the package root inside the installer container.
pub const ASSET_INPUT_DIR: &str = "/asset-input";

/// Mount point of the output directory inside the installer container.
pub const ASSET_OUTPUT_DIR: &str = "/asset-output";

/// A bind mount for a container run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Directory on the host.
    pub host_path: PathBuf,
    /// Mount point inside the container.
    pub container_path: String,
}

/// Options for a single container run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerRunOptions {
    /// Command (entrypoint arguments) to run.
    pub command: Vec<String>,
    /// Bind mounts.
    pub volumes: Vec<Volume>,
    /// Working directory inside the container.
    pub workdir: Option<String>,
    /// `uid:gid` to run as.
    pub user: Option<String>,
    /// Extra environment variables.
    pub environment: BTreeMap<String, String>,
}

/// Operations the stager needs from a container image.
pub trait ContainerImage: std::fmt::Debug {
    /// Run the image with `options`, blocking until it exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be built or the run fails.
    fn run(&self, options: &DockerRunOptions) -> Result<()>;

    /// Copy `image_path` out of the image into `output_path` (a fresh
    /// temporary directory when `None`) and return the host path.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be built or the copy fails.
    fn cp(&self, image_path: &str, output_path: Option<&Path>) -> Result<PathBuf>;
}

/// The container slot of an [`EngineSelection`].
///
/// Always present: either a real image or a stand-in that fails loudly.
#[derive(Debug)]
pub enum ContainerEngine {
    /// The installer image.
    Docker(DockerImage),
    /// A slot that must never be reached.
    Unavailable(UnavailableImage),
}

impl ContainerEngine {
    /// Whether this slot holds a real container image.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Docker(_))
    }
}

impl ContainerImage for ContainerEngine {
    fn run(&self, options: &DockerRunOptions) -> Result<()> {
        match self {
            Self::Docker(image) => image.run(options),
            Self::Unavailable(image) => image.run(options),
        }
    }

    fn cp(&self, image_path: &str, output_path: Option<&Path>) -> Result<PathBuf> {
        match self {
            Self::Docker(image) => image.cp(image_path, output_path),
            Self::Unavailable(image) => image.cp(image_path, output_path),
        }
    }
}

/// The engines offered to the stager for one request.
#[derive(Debug)]
pub struct EngineSelection {
    /// Tried first when present.
    pub local: Option<LocalEngine>,
    /// Tried when the local engine is absent or fails.
    pub container: ContainerEngine,
}

/// Constructs engine values for the selector.
///
/// Construction must not touch the filesystem or spawn processes; engines do
/// their work only when invoked.
pub trait EngineFactory {
    /// A local engine for the package being bundled.
    fn local_engine(&self) -> LocalEngine;

    /// The installer image (not yet built).
    fn container_image(&self) -> DockerImage;
}

/// Concrete engine configuration for one package.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Root of the package being bundled.
    pub package_root: PathBuf,
    /// Package manager executable.
    pub package_manager: String,
    /// Container runtime executable.
    pub docker: String,
    /// Build context of the installer image.
    pub installer_dir: PathBuf,
    /// Runs the engines' external commands.
    pub runner: Arc<dyn ProcessRunner>,
}

impl EngineSettings {
    /// Settings with the default executables and the host process runner.
    pub fn new(package_root: impl Into<PathBuf>, installer_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_root: package_root.into(),
            package_manager: "yarn".to_string(),
            docker: "docker".to_string(),
            installer_dir: installer_dir.into(),
            runner: Arc::new(SystemRunner),
        }
    }

    /// Replace the process runner.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }
}

impl EngineFactory for EngineSettings {
    fn local_engine(&self) -> LocalEngine {
        LocalEngine::new(
            &self.package_root,
            &self.package_manager,
            Arc::clone(&self.runner),
        )
    }

    fn container_image(&self) -> DockerImage {
        DockerImage::from_build(&self.docker, &self.installer_dir, Arc::clone(&self.runner))
    }
}
