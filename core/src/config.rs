use crate::client::{ClientConfig, FALLBACK_MESSAGE};
use crate::directive::{EmptyDirectivePolicy, ExtractorConfig};
use crate::errors::{PantryError, PantryResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Preference tags offered by the storefront's assistant panel
pub const DEFAULT_DIETARY_OPTIONS: [&str; 3] = ["Vegetarian", "Halal", "Gluten-Free"];

/// Configuration for the pantry assistant
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PantryConfig {
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub fallback_message: Option<String>,
    pub dietary_options: Option<Vec<String>>,
    pub max_directives: Option<usize>,
    pub max_payload_bytes: Option<usize>,
    pub restore_empty_directives: Option<bool>,
    pub log_level: Option<String>,
}

impl Default for PantryConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            fallback_message: Some(FALLBACK_MESSAGE.to_string()),
            dietary_options: Some(DEFAULT_DIETARY_OPTIONS.iter().map(|s| s.to_string()).collect()),
            max_directives: None,
            max_payload_bytes: None,
            restore_empty_directives: Some(false),
            log_level: Some("info".to_string()),
        }
    }
}

impl PantryConfig {
    /// An all-`None` config, used as an override layer
    pub fn empty() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: None,
            fallback_message: None,
            dietary_options: None,
            max_directives: None,
            max_payload_bytes: None,
            restore_empty_directives: None,
            log_level: None,
        }
    }

    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> PantryResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PantryError::Config(format!("Failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PantryError::Config(format!("Failed to parse config file: {}", e)))?;

        // Fields absent from the file keep their defaults
        Ok(Self::default().merge(&config))
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> PantryResult<()> {
        let content = toml::to_string(self)
            .map_err(|e| PantryError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PantryError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .map_err(|e| PantryError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            endpoint: other.endpoint.clone().or_else(|| self.endpoint.clone()),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            fallback_message: other
                .fallback_message
                .clone()
                .or_else(|| self.fallback_message.clone()),
            dietary_options: other
                .dietary_options
                .clone()
                .or_else(|| self.dietary_options.clone()),
            max_directives: other.max_directives.or(self.max_directives),
            max_payload_bytes: other.max_payload_bytes.or(self.max_payload_bytes),
            restore_empty_directives: other
                .restore_empty_directives
                .or(self.restore_empty_directives),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let empty_policy = if self.restore_empty_directives.unwrap_or(false) {
            EmptyDirectivePolicy::RestoreAsProse
        } else {
            EmptyDirectivePolicy::Discard
        };

        ExtractorConfig {
            empty_policy,
            max_directives: self.max_directives,
            max_payload_bytes: self.max_payload_bytes,
            ..ExtractorConfig::default()
        }
    }

    pub fn client_config(&self) -> PantryResult<ClientConfig> {
        let endpoint = self
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| PantryError::Config("No assistant endpoint configured".to_string()))?;

        Ok(ClientConfig {
            endpoint,
            timeout: self.request_timeout_secs.map(Duration::from_secs),
            extractor: self.extractor_config(),
        })
    }

    pub fn fallback_message(&self) -> &str {
        self.fallback_message.as_deref().unwrap_or(FALLBACK_MESSAGE)
    }

    pub fn dietary_options(&self) -> Vec<String> {
        self.dietary_options
            .clone()
            .unwrap_or_else(|| DEFAULT_DIETARY_OPTIONS.iter().map(|s| s.to_string()).collect())
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> PantryResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or_else(|| PantryError::Config("Could not determine config directory".to_string()))?;

    Ok(config_dir.join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> PantryResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
