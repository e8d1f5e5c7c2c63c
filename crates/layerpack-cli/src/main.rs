//! layerpack - bundle node package dependencies into layers

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use layerpack_cli::config::Config;
use layerpack_cli::ops::BundleSettings;
use layerpack_cli::{Cli, Commands, cmd};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or warn with --quiet. Logs go to stderr
    // so stdout carries only the command's result.
    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    match cli.command {
        Commands::Bundle { package, flags } => {
            let config = Config::discover(cli.config.as_deref(), &cwd)?;
            let settings = BundleSettings::resolve(&flags, &config, &cwd)?;
            cmd::bundle::bundle(&package, &settings)
        }
        Commands::Locate {
            package,
            subdirectory,
            from,
        } => {
            let from = from.map_or_else(|| cwd.clone(), |dir| cwd.join(dir));
            cmd::locate::locate(&package, subdirectory.as_deref(), &from)
        }
        Commands::Modes => {
            cmd::modes::modes();
            Ok(())
        }
    }
}
