//! Subcommand implementations.

pub mod bundle;
pub mod locate;
pub mod modes;
