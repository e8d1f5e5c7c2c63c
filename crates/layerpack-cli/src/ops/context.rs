//! Effective bundle settings.
//!
//! Merges command-line flags (which already carry their `LAYERPACK_*`
//! environment fallbacks) with the config file and the built-in defaults,
//! and turns the result into a [`PackagingContext`].

use std::path::{Path, PathBuf};

use layerpack_core::engine::EngineSettings;
use layerpack_core::stager::AssetStager;
use layerpack_core::{
    BundlingOptions, ManifestRegistrar, NodeModulesLocator, PackagingContext, Stage,
};

use super::{ConfigError, InstallerContext};
use crate::BundleFlags;
use crate::config::Config;

/// Stage directory used when neither flag nor config names one.
pub const DEFAULT_STAGE_DIR: &str = "layer.out";

/// Settings for one `layerpack bundle` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSettings {
    pub options: BundlingOptions,
    pub package_manager: String,
    pub docker: String,
    /// `None` builds from the context compiled into the binary.
    pub installer_dir: Option<PathBuf>,
    /// `None` stages under the system temp directory.
    pub stage_dir: Option<PathBuf>,
    /// Where the `node_modules` lookup starts.
    pub search_from: PathBuf,
}

impl BundleSettings {
    /// Merge `flags` over `config`, resolving relative paths against `cwd`.
    pub fn resolve(flags: &BundleFlags, config: &Config, cwd: &Path) -> Result<Self, ConfigError> {
        let options = BundlingOptions {
            bundle_mode: flags.mode.or(config.bundling.mode),
        };

        let staging = if flags.no_staging {
            false
        } else {
            flags.stage_dir.is_some() || config.staging.enabled.unwrap_or(true)
        };
        let stage_dir = staging.then(|| {
            let dir = flags
                .stage_dir
                .clone()
                .or_else(|| config.staging.outdir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGE_DIR));
            cwd.join(dir)
        });

        let installer_dir = flags
            .installer_dir
            .clone()
            .or_else(|| config.bundling.installer_dir.clone())
            .map(|dir| cwd.join(dir));

        let search_from = flags
            .from
            .as_ref()
            .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));
        if !search_from.is_dir() {
            return Err(ConfigError::context(
                "Lookup directory does not exist",
                search_from.display(),
            ));
        }

        Ok(Self {
            options,
            package_manager: config
                .bundling
                .package_manager
                .clone()
                .unwrap_or_else(|| "yarn".to_string()),
            docker: config
                .bundling
                .docker
                .clone()
                .unwrap_or_else(|| "docker".to_string()),
            installer_dir,
            stage_dir,
            search_from,
        })
    }

    /// The installer build context to hand to `docker build`.
    pub fn installer(&self) -> std::io::Result<InstallerContext> {
        InstallerContext::resolve(self.installer_dir.as_deref())
    }

    /// Context running the host's package manager and container runtime.
    ///
    /// `installer` must stay alive while the returned context is in use.
    pub fn packaging_context(&self, installer: &InstallerContext) -> PackagingContext {
        let stage = self.stage_dir.as_ref().map(Stage::new);
        let registry_dir = stage.as_ref().map_or_else(
            || AssetStager::unstaged().outdir().to_path_buf(),
            |s| s.asset_outdir.clone(),
        );

        let mut engines = EngineSettings::new(PathBuf::new(), installer.path());
        engines.package_manager.clone_from(&self.package_manager);
        engines.docker.clone_from(&self.docker);

        PackagingContext::new(
            Box::new(NodeModulesLocator::from_env(&self.search_from)),
            engines,
            stage,
            Box::new(ManifestRegistrar::new(registry_dir)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerpack_schema::BundleMode;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let tmp = tempdir().unwrap();
        let settings =
            BundleSettings::resolve(&BundleFlags::default(), &Config::default(), tmp.path())
                .unwrap();

        assert_eq!(settings.options, BundlingOptions::default());
        assert_eq!(settings.options.mode(), BundleMode::LocalWithDockerFallback);
        assert_eq!(settings.package_manager, "yarn");
        assert_eq!(settings.docker, "docker");
        assert_eq!(settings.stage_dir, Some(tmp.path().join(DEFAULT_STAGE_DIR)));
        assert_eq!(settings.installer_dir, None);
        assert_eq!(settings.search_from, tmp.path());
    }

    #[test]
    fn test_default_installer_is_embedded() {
        let tmp = tempdir().unwrap();
        let settings =
            BundleSettings::resolve(&BundleFlags::default(), &Config::default(), tmp.path())
                .unwrap();

        let installer = settings.installer().unwrap();
        assert!(matches!(installer, InstallerContext::Embedded(_)));
        assert!(installer.path().join("Dockerfile").is_file());
        assert!(installer.path().join("install.sh").is_file());

        let mut config = Config::default();
        config.bundling.installer_dir = Some(PathBuf::from("docker"));
        let settings =
            BundleSettings::resolve(&BundleFlags::default(), &config, tmp.path()).unwrap();
        assert_eq!(settings.installer_dir, Some(tmp.path().join("docker")));
        assert_eq!(settings.installer().unwrap().path(), tmp.path().join("docker"));
    }

    #[test]
    fn test_flags_override_config() {
        let tmp = tempdir().unwrap();
        let mut config = Config::default();
        config.bundling.mode = Some(BundleMode::DockerOnly);
        config.bundling.docker = Some("podman".to_string());
        config.staging.outdir = Some(PathBuf::from("from-config"));

        let flags = BundleFlags {
            mode: Some(BundleMode::LocalOnly),
            stage_dir: Some(PathBuf::from("from-flag")),
            ..BundleFlags::default()
        };
        let settings = BundleSettings::resolve(&flags, &config, tmp.path()).unwrap();

        assert_eq!(settings.options.mode(), BundleMode::LocalOnly);
        assert_eq!(settings.docker, "podman");
        assert_eq!(settings.stage_dir, Some(tmp.path().join("from-flag")));
    }

    #[test]
    fn test_staging_can_be_disabled() {
        let tmp = tempdir().unwrap();
        let mut config = Config::default();
        config.staging.enabled = Some(false);

        let settings = BundleSettings::resolve(&BundleFlags::default(), &config, tmp.path())
            .unwrap();
        assert_eq!(settings.stage_dir, None);

        let flags = BundleFlags {
            stage_dir: Some(PathBuf::from("out")),
            no_staging: true,
            ..BundleFlags::default()
        };
        let settings = BundleSettings::resolve(&flags, &Config::default(), tmp.path()).unwrap();
        assert_eq!(settings.stage_dir, None);
        let installer = settings.installer().unwrap();
        assert!(settings.packaging_context(&installer).stage().is_none());
    }

    #[test]
    fn test_missing_lookup_directory() {
        let tmp = tempdir().unwrap();
        let flags = BundleFlags {
            from: Some(PathBuf::from("missing")),
            ..BundleFlags::default()
        };
        let err = BundleSettings::resolve(&flags, &Config::default(), tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Context { .. }));
    }
}
