//! The packaging pipeline.
//!
//! [`Dependencies::from_package`] turns a package name and
//! [`BundlingOptions`] into a registered layer: locate the package, fill the
//! engine slots for the requested mode, stage the bundle, resolve its path,
//! register it.

use layerpack_schema::{PackageName, PackageRequest};

use crate::engine::EngineSettings;
use crate::error::Result;
use crate::locator::PackageLocator;
use crate::paths::{Stage, resolve_output};
use crate::registrar::{LayerRegistrar, LayerRequest, LayerVersion};
use crate::selector::{BundlingOptions, select_with_options};
use crate::stager::AssetStager;

/// Everything a packaging request needs, passed explicitly.
#[derive(Debug)]
pub struct PackagingContext {
    locator: Box<dyn PackageLocator>,
    engines: EngineSettings,
    stage: Option<Stage>,
    registrar: Box<dyn LayerRegistrar>,
}

impl PackagingContext {
    /// A context staging under `stage`, or unstaged when `None`.
    ///
    /// `engines` is a template: its `package_root` is replaced by the root of
    /// each located package.
    pub fn new(
        locator: Box<dyn PackageLocator>,
        engines: EngineSettings,
        stage: Option<Stage>,
        registrar: Box<dyn LayerRegistrar>,
    ) -> Self {
        Self {
            locator,
            engines,
            stage,
            registrar,
        }
    }

    /// The enclosing stage, if any.
    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    /// The stager matching the stage.
    pub fn stager(&self) -> AssetStager {
        self.stage
            .as_ref()
            .map_or_else(AssetStager::unstaged, AssetStager::for_stage)
    }
}

/// Dependency layers built from node packages.
#[derive(Debug)]
pub struct Dependencies;

impl Dependencies {
    /// Bundle the dependencies of the requested package into a layer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BundleError::InvalidPackageName`] for a malformed
    /// name, [`crate::BundleError::PackageNotFound`] when the package cannot
    /// be located, the container slot's error when bundling fails, or an IO
    /// error from staging or registration.
    pub fn from_package(
        ctx: &PackagingContext,
        package_name: &str,
        options: &BundlingOptions,
    ) -> Result<LayerVersion> {
        let request = PackageRequest::new(PackageName::parse(package_name)?, options.mode());
        let package = ctx.locator.locate(&request.package_name)?;
        let manifest = package.manifest()?;
        tracing::info!(
            "Bundling {} from {} ({})",
            package.name(),
            package.root_directory().display(),
            request.mode
        );

        let settings = EngineSettings {
            package_root: package.root_directory().to_path_buf(),
            ..ctx.engines.clone()
        };
        let selection = select_with_options(options, &settings);

        let asset = ctx.stager().stage(&package, &selection)?;
        let artifact = resolve_output(&asset.output, ctx.stage());

        ctx.registrar.register(&LayerRequest {
            package: &request.package_name,
            version: manifest.version_or_default(),
            artifact: &artifact,
            bundle_mode: request.mode,
            fingerprint: &asset.fingerprint,
            staged_by: asset.staged_by,
        })
    }
}
