//! Modes command

use crossterm::style::Stylize;

use layerpack_schema::BundleMode;

/// List every bundle mode and what it offers the stager.
pub fn modes() {
    let width = BundleMode::ALL
        .iter()
        .map(|m| m.as_str().len())
        .max()
        .unwrap_or(0);

    for mode in BundleMode::ALL {
        let default = if mode == BundleMode::default() {
            " (default)".dark_grey().to_string()
        } else {
            String::new()
        };
        let name = format!("{:<width$}", mode.as_str());
        println!("  {}  {}{default}", name.bold(), mode.describe());
    }
}
