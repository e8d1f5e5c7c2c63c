//! Error taxonomy for packaging requests.
//!
//! Engine-level process and OS failures are converted into these variants at
//! the engine boundary, so callers never deal with raw `std::process` errors.

use std::path::PathBuf;
use thiserror::Error;

use layerpack_schema::PackageNameError;

/// Result alias used throughout the core crate.
pub type Result<T, E = BundleError> = std::result::Result<T, E>;

/// Errors surfaced by a packaging request.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The package could not be resolved to a directory containing a manifest.
    #[error("Package not found: {name}")]
    PackageNotFound {
        /// The requested package name.
        name: String,
    },

    /// The package name failed validation.
    #[error("Invalid package name: {0}")]
    InvalidPackageName(#[from] PackageNameError),

    /// The local install failed and no further tier was offered.
    #[error("Local bundling failed: {message}")]
    LocalBundling {
        /// What went wrong.
        message: String,
    },

    /// The container image build or run failed. There is no tier below it.
    #[error("Container bundling failed: {message}")]
    ContainerBundling {
        /// What went wrong.
        message: String,
    },

    /// A deliberately unavailable engine was invoked.
    ///
    /// Displays exactly the configured diagnostic.
    #[error("{message}")]
    EngineUnavailable {
        /// The configured diagnostic.
        message: String,
    },

    /// The package manifest could not be read or parsed.
    #[error("Invalid manifest {}: {message}", path.display())]
    Manifest {
        /// Path of the offending manifest.
        path: PathBuf,
        /// Parser or reader message.
        message: String,
    },

    /// A path argument was rejected.
    #[error("Invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Filesystem error outside any engine (staging, registration).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BundleError {
    /// Shorthand for a container-tier failure.
    pub fn container(msg: impl std::fmt::Display) -> Self {
        Self::ContainerBundling {
            message: msg.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_displays_message_verbatim() {
        let err = BundleError::EngineUnavailable {
            message: "docker bundling disabled; local bundling must have failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "docker bundling disabled; local bundling must have failed"
        );
    }

    #[test]
    fn test_invalid_name_converts() {
        let err: BundleError = layerpack_schema::PackageName::parse("../etc")
            .unwrap_err()
            .into();
        assert!(matches!(err, BundleError::InvalidPackageName(_)));
        assert!(err.to_string().starts_with("Invalid package name:"));
    }
}
