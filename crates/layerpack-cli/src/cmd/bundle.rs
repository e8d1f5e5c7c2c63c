//! Bundle command

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use layerpack_core::Dependencies;

use crate::ops::BundleSettings;

/// Bundle `package` and print the absolute layer directory on stdout.
pub fn bundle(package: &str, settings: &BundleSettings) -> Result<()> {
    let installer = settings
        .installer()
        .context("Failed to prepare the installer build context")?;
    let ctx = settings.packaging_context(&installer);

    let layer = Dependencies::from_package(&ctx, package, &settings.options)
        .with_context(|| format!("Failed to bundle '{package}' ({})", settings.options.mode()))?;

    eprintln!(
        "{} {}@{} via {}",
        "bundled".green().bold(),
        layer.package,
        layer.version,
        layer.staged_by
    );
    println!("{}", layer.code_path.display());
    Ok(())
}
