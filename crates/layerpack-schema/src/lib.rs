//! Shared types for layerpack.
//!
//! These are the values that flow between the core library and the CLI:
//! validated package names, the bundle mode, and asset fingerprints.

pub mod hash;
pub mod mode;
pub mod types;

// Re-exports
pub use hash::Fingerprint;
pub use mode::BundleMode;
pub use types::{PackageName, PackageNameError, PackageRequest};

/// Name of the dependency manifest inside a package root.
pub const MANIFEST_FILE: &str = "package.json";

/// Name of the lockfile that, when present, pins the manifest's dependencies.
pub const LOCKFILE: &str = "yarn.lock";
