//! Package names and packaging requests.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::path::{Path, PathBuf};

/// Errors that can occur when validating a [`PackageName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageNameError {
    /// The name is empty (or only whitespace).
    #[error("package name is empty")]
    Empty,

    /// A scoped name is not of the form `@scope/name`.
    #[error("malformed scoped package name: {0}")]
    MalformedScope(String),

    /// The name would escape the modules directory it is looked up in.
    #[error("package name must not contain path traversal: {0}")]
    PathTraversal(String),
}

/// A validated package name as written in a dependency manifest.
///
/// Accepts bare names (`left-pad`) and scoped names (`@aws-sdk/client-s3`).
/// Case is preserved because module lookups are case-sensitive on most
/// filesystems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Parse and validate a package name.
    ///
    /// # Errors
    ///
    /// Returns [`PackageNameError`] if the name is empty, is an absolute path,
    /// contains `..` or backslashes, or is a malformed `@scope/name`.
    pub fn parse(name: &str) -> Result<Self, PackageNameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PackageNameError::Empty);
        }
        if name.starts_with('/') || name.contains('\\') {
            return Err(PackageNameError::PathTraversal(name.to_string()));
        }

        let segments: Vec<&str> = name.split('/').collect();
        if segments.iter().any(|s| *s == ".." || *s == ".") {
            return Err(PackageNameError::PathTraversal(name.to_string()));
        }

        match segments.as_slice() {
            [bare] if !bare.starts_with('@') => {}
            [scope, pkg] if scope.len() > 1 && scope.starts_with('@') && !pkg.is_empty() => {}
            _ => return Err(PackageNameError::MalformedScope(name.to_string())),
        }

        Ok(Self(name.to_string()))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Relative path of this package below a `node_modules` directory.
    pub fn module_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl TryFrom<String> for PackageName {
    type Error = PackageNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl std::str::FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for PackageName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A packaging request: which package to bundle, and how.
///
/// Created per invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    /// The package whose dependencies are bundled.
    pub package_name: PackageName,
    /// The requested bundling policy.
    pub mode: crate::BundleMode,
}

impl PackageRequest {
    /// Create a request with an explicit mode.
    pub fn new(package_name: PackageName, mode: crate::BundleMode) -> Self {
        Self { package_name, mode }
    }
}
