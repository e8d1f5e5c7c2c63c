//! Locate command

use anyhow::{Context, Result};
use std::path::Path;

use layerpack_core::{NodeModulesLocator, code_path};

/// Print the code directory of `package`, looked up from `from`.
pub fn locate(package: &str, subdirectory: Option<&Path>, from: &Path) -> Result<()> {
    let locator = NodeModulesLocator::from_env(from);
    let path = code_path(&locator, package, subdirectory)
        .with_context(|| format!("Failed to locate '{package}'"))?;
    println!("{}", path.display());
    Ok(())
}
