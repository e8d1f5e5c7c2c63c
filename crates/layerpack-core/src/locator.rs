//! Package lookup.
//!
//! Resolves a declared package name to the directory holding its
//! `package.json`, the same way a module loader would: walk up from a base
//! directory looking in each `node_modules`, then try the extra search paths.
//! A miss is a hard [`BundleError::PackageNotFound`]; there are no retries.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use layerpack_schema::{MANIFEST_FILE, PackageName};

use crate::error::{BundleError, Result};
use crate::manifest::PackageManifest;

const MODULES_DIR: &str = "node_modules";

/// A package whose root directory exists and contains a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    name: PackageName,
    root_directory: PathBuf,
}

impl ResolvedPackage {
    /// Wrap a package root, checking that it holds a manifest.
    ///
    /// The root is canonicalized so that later stages always see an
    /// absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::PackageNotFound`] if `root` has no manifest.
    pub fn from_root(name: PackageName, root: &Path) -> Result<Self> {
        if !root.join(MANIFEST_FILE).is_file() {
            return Err(BundleError::PackageNotFound {
                name: name.to_string(),
            });
        }
        let root_directory = root.canonicalize()?;
        Ok(Self {
            name,
            root_directory,
        })
    }

    /// The package name this root was resolved from.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// Absolute package root.
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Absolute path of the package's `package.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.root_directory.join(MANIFEST_FILE)
    }

    /// Read and parse the package's manifest.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Manifest`] if the manifest is unreadable or invalid.
    pub fn manifest(&self) -> Result<PackageManifest> {
        PackageManifest::load(&self.manifest_path())
    }
}

/// Resolves package names to installed package roots.
pub trait PackageLocator: fmt::Debug {
    /// Find the installed package called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::PackageNotFound`] if no installed manifest exists.
    fn locate(&self, name: &PackageName) -> Result<ResolvedPackage>;
}

/// Module-loader style lookup through `node_modules` directories.
#[derive(Debug, Clone)]
pub struct NodeModulesLocator {
    base_dir: PathBuf,
    search_paths: Vec<PathBuf>,
}

impl NodeModulesLocator {
    /// Look up packages starting at `base_dir` and walking up to the root.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            search_paths: Vec::new(),
        }
    }

    /// Like [`new`](Self::new), with `NODE_PATH` entries as extra search paths.
    pub fn from_env(base_dir: impl Into<PathBuf>) -> Self {
        let search_paths = std::env::var_os("NODE_PATH")
            .map(|raw| {
                std::env::split_paths(&raw)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(base_dir).with_search_paths(search_paths)
    }

    /// Extra directories searched (directly, not via `node_modules`) after
    /// the ancestor walk.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Candidate package roots for `name`, in lookup order.
    pub fn candidates(&self, name: &PackageName) -> Vec<PathBuf> {
        let module_path = name.module_path();
        let mut candidates: Vec<PathBuf> = self
            .base_dir
            .ancestors()
            .filter(|dir| dir.file_name().is_none_or(|n| n != MODULES_DIR))
            .map(|dir| dir.join(MODULES_DIR).join(&module_path))
            .collect();
        candidates.extend(self.search_paths.iter().map(|p| p.join(&module_path)));
        candidates
    }
}

impl PackageLocator for NodeModulesLocator {
    fn locate(&self, name: &PackageName) -> Result<ResolvedPackage> {
        for candidate in self.candidates(name) {
            if candidate.join(MANIFEST_FILE).is_file() {
                tracing::debug!("Resolved {name} to {}", candidate.display());
                return ResolvedPackage::from_root(name.clone(), &candidate);
            }
        }
        Err(BundleError::PackageNotFound {
            name: name.to_string(),
        })
    }
}

/// Path of a function code asset taken straight from a package directory.
///
/// Unlike dependency bundling nothing is installed: the returned directory is
/// the package root, or `subdirectory` below it.
///
/// # Errors
///
/// Returns [`BundleError::InvalidPackageName`] for a malformed name,
/// [`BundleError::PackageNotFound`] if the package cannot be located, or
/// [`BundleError::InvalidPath`] if `subdirectory` is absolute or climbs out of
/// the package root.
pub fn code_path(
    locator: &dyn PackageLocator,
    package_name: &str,
    subdirectory: Option<&Path>,
) -> Result<PathBuf> {
    let package = locator.locate(&PackageName::parse(package_name)?)?;
    let Some(sub) = subdirectory else {
        return Ok(package.root_directory().to_path_buf());
    };

    if sub
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(BundleError::InvalidPath {
            path: sub.to_path_buf(),
            reason: "subdirectory must be relative to the package root",
        });
    }
    Ok(package.root_directory().join(sub))
}
