//! layerpack - dependency layers for node packages
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Command-line front end of `layerpack-core`. Settings are merged from
//! command-line flags, `LAYERPACK_*` environment variables and an optional
//! `layerpack.toml`, in that order of precedence.
//!
//! # Layout
//!
//! ```text
//! layer.out/
//! ├── asset.<fingerprint>/   # package.json + nodejs/node_modules
//! └── layers.json            # registered layer versions
//! ```

pub mod cmd;
pub mod config;
pub mod ops;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use layerpack_schema::BundleMode;

#[derive(Debug, Parser)]
#[command(name = "layerpack")]
#[command(
    author,
    version = env!("LAYERPACK_VERSION"),
    about = "layerpack - bundle node package dependencies into layers"
)]
pub struct Cli {
    /// Configuration file (defaults to ./layerpack.toml when present)
    #[arg(long, global = true, env = "LAYERPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bundle a package's dependencies into a layer
    Bundle {
        /// Package name, e.g. my-deps or @scope/my-deps
        package: String,
        #[command(flatten)]
        flags: BundleFlags,
    },
    /// Print the code directory of a package
    Locate {
        /// Package name
        package: String,
        /// Directory inside the package to use instead of its root
        #[arg(long)]
        subdirectory: Option<PathBuf>,
        /// Directory to start the package lookup from
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// List the bundle modes
    Modes,
}

/// Flags of `layerpack bundle`.
#[derive(Debug, Clone, Default, Args)]
pub struct BundleFlags {
    /// Bundle mode: local-with-docker-fallback, local-only or docker-only
    #[arg(long, env = "LAYERPACK_BUNDLE_MODE")]
    pub mode: Option<BundleMode>,

    /// Directory to start the package lookup from
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Directory to stage assets and layers.json in
    #[arg(long, env = "LAYERPACK_STAGE_DIR")]
    pub stage_dir: Option<PathBuf>,

    /// Stage under the system temp directory instead of a stage directory
    #[arg(long)]
    pub no_staging: bool,

    /// Build context of the installer image
    #[arg(long, env = "LAYERPACK_INSTALLER_DIR")]
    pub installer_dir: Option<PathBuf>,
}
