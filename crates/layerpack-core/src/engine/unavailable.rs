use std::path::{Path, PathBuf};

use super::{ContainerImage, DockerRunOptions};
use crate::error::{BundleError, Result};

/// A container slot that fails every operation with a fixed diagnostic.
///
/// Fills the container slot when container bundling is disabled, so that
/// reaching it produces a readable error instead of an unintended build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableImage {
    message: String,
}

impl UnavailableImage {
    /// Create a stand-in that fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The configured diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn fail<T>(&self) -> Result<T> {
        Err(BundleError::EngineUnavailable {
            message: self.message.clone(),
        })
    }
}

impl Default for UnavailableImage {
    fn default() -> Self {
        Self::new("Not implemented")
    }
}

impl ContainerImage for UnavailableImage {
    fn run(&self, _options: &DockerRunOptions) -> Result<()> {
        self.fail()
    }

    fn cp(&self, _image_path: &str, _output_path: Option<&Path>) -> Result<PathBuf> {
        self.fail()
    }
}
