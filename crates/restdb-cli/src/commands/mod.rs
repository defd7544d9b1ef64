//! CLI command implementations for RestDB.

pub mod check;
pub mod encode;
pub mod parse;
pub mod request;
pub mod rewrite;

use anyhow::Context;
use restdb_core::RestDbConfig;
use std::path::Path;

/// Load and validate the configuration, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RestDbConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            RestDbConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(RestDbConfig::default()),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
