//! Operations shared by the subcommands.

pub mod context;
pub mod error;
pub mod installer;

pub use context::BundleSettings;
pub use error::ConfigError;
pub use installer::InstallerContext;
