//! `layerpack.toml` parsing.
//!
//! ```toml
//! [bundling]
//! mode = "local-only"
//! package_manager = "yarn"
//! docker = "docker"
//! installer_dir = "installer"
//!
//! [staging]
//! outdir = "layer.out"
//! enabled = true
//! ```
//!
//! Every key is optional. Relative paths are relative to the file's own
//! directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use layerpack_schema::BundleMode;

use crate::ops::ConfigError;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "layerpack.toml";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub bundling: BundlingConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

/// `[bundling]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundlingConfig {
    pub mode: Option<BundleMode>,
    pub package_manager: Option<String>,
    pub docker: Option<String>,
    pub installer_dir: Option<PathBuf>,
}

/// `[staging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    pub outdir: Option<PathBuf>,
    pub enabled: Option<bool>,
}

impl Config {
    /// Parse `content`, read from `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file at `path`, resolving its relative paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, path)?;
        if let Some(dir) = path.parent() {
            config.rebase(dir);
        }
        Ok(config)
    }

    /// Load `explicit` if given, else `<cwd>/layerpack.toml` if present,
    /// else the empty configuration.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(&cwd.join(path));
        }
        let default = cwd.join(CONFIG_FILE);
        if default.is_file() {
            tracing::debug!("Using {}", default.display());
            return Self::load(&default);
        }
        Ok(Self::default())
    }

    fn rebase(&mut self, dir: &Path) {
        for path in [
            &mut self.bundling.installer_dir,
            &mut self.staging.outdir,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}
