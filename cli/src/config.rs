use anyhow::{Context, Result};
use pantry_core::config::{get_default_config_file, PantryConfig};

use crate::cli::Args;

pub const APP_NAME: &str = "pantry";

/// Builds the effective config: defaults, then the config file, then command-line flags
pub fn resolve_config(args: &Args) -> Result<PantryConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME).context("Failed to locate config file")?,
    };

    let file_config = PantryConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    Ok(file_config.merge(&overrides_from_args(args)))
}

fn overrides_from_args(args: &Args) -> PantryConfig {
    PantryConfig {
        endpoint: args.endpoint.clone(),
        request_timeout_secs: args.timeout,
        log_level: args.verbose.then(|| "debug".to_string()),
        ..PantryConfig::empty()
    }
}
