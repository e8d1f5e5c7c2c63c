//! Dependency layer bundling for node packages.
//!
//! Locates a package, installs its production dependencies with the local
//! package manager or inside an installer container, stages the result as
//! `asset.<fingerprint>` and registers it as a layer version. How the two
//! engines are combined is governed by a [`layerpack_schema::BundleMode`].

pub mod dependencies;
pub mod engine;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod paths;
pub mod process;
pub mod registrar;
pub mod selector;
pub mod stager;

pub use dependencies::{Dependencies, PackagingContext};
pub use error::{BundleError, Result};
pub use locator::{NodeModulesLocator, PackageLocator, ResolvedPackage, code_path};
pub use paths::*;
pub use registrar::{LayerRegistrar, LayerVersion, ManifestRegistrar};
pub use selector::{BundlingOptions, select, select_with_options};
pub use stager::StagedBy;
