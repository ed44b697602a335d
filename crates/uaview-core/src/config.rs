// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Explorer configuration and its loader.
//!
//! # Loading Pipeline
//!
//! 1. Pick the format from the file extension (`.yaml`/`.yml`, `.toml`, `.json`)
//! 2. Parse into [`ExplorerConfig`]; missing fields take their defaults
//! 3. Apply environment overrides
//! 4. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! UAVIEW_REBROWSE_ON_EXPAND=true
//! UAVIEW_PAGE_SIZE=250
//! UAVIEW_PUBLISHING_INTERVAL=500ms
//! UAVIEW_SAMPLING_INTERVAL=1s
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::session::DEFAULT_PAGE_SIZE;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "UAVIEW";

// =============================================================================
// ExplorerConfig
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Browse behaviour.
    #[serde(default)]
    pub browse: BrowseSettings,

    /// Subscription behaviour.
    #[serde(default)]
    pub subscription: SubscriptionSettings,
}

impl ExplorerConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.browse.validate()?;
        self.subscription.validate()?;
        Ok(())
    }
}

// =============================================================================
// BrowseSettings
// =============================================================================

/// Settings of the browse engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseSettings {
    /// Re-fetch children every time an entry is expanded.
    #[serde(default)]
    pub rebrowse_on_expand: bool,

    /// References requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl BrowseSettings {
    /// Validates the settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::validation("browse.page_size", "must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            rebrowse_on_expand: false,
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

// =============================================================================
// SubscriptionSettings
// =============================================================================

/// Settings of the subscription manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// Publishing interval of new subscriptions.
    #[serde(default = "default_interval")]
    #[serde(with = "humantime_serde")]
    pub publishing_interval: Duration,

    /// Sampling interval requested for monitored items.
    #[serde(default = "default_interval")]
    #[serde(with = "humantime_serde")]
    pub sampling_interval: Duration,
}

impl SubscriptionSettings {
    /// Validates the settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.publishing_interval.is_zero() {
            return Err(ConfigError::validation(
                "subscription.publishing_interval",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            publishing_interval: default_interval(),
            sampling_interval: default_interval(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_millis(250)
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads [`ExplorerConfig`] from files or strings.
///
/// ```no_run
/// use uaview_core::config::ConfigLoader;
///
/// let config = ConfigLoader::new().load("uaview.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    apply_env: bool,
}

impl ConfigLoader {
    /// Creates a loader using the `UAVIEW` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            apply_env: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.apply_env = enabled;
        self
    }

    /// Loads configuration from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<ExplorerConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let format = ConfigFormat::from_path(path)?;

        let config = self.parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;
        self.finish(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<ExplorerConfig> {
        let config = self.parse_str(content, format)?;
        self.finish(config)
    }

    fn finish(&self, mut config: ExplorerConfig) -> ConfigResult<ExplorerConfig> {
        if self.apply_env {
            self.apply_env_overrides(&mut config)?;
        }
        config.validate()?;
        debug!(
            page_size = config.browse.page_size,
            rebrowse_on_expand = config.browse.rebrowse_on_expand,
            publishing_interval_ms = config.subscription.publishing_interval.as_millis() as u64,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn parse_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<ExplorerConfig> {
        if content.trim().is_empty() {
            return Ok(ExplorerConfig::default());
        }
        match format {
            ConfigFormat::Yaml => yaml_parse(content),
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
        }
    }

    fn apply_env_overrides(&self, config: &mut ExplorerConfig) -> ConfigResult<()> {
        if let Some(value) = self.env_value("REBROWSE_ON_EXPAND") {
            config.browse.rebrowse_on_expand = parse_bool(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(
                    self.env_name("REBROWSE_ON_EXPAND"),
                    "expected a boolean",
                )
            })?;
        }
        if let Some(value) = self.env_value("PAGE_SIZE") {
            config.browse.page_size = value.trim().parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    self.env_name("PAGE_SIZE"),
                    "expected a positive number",
                )
            })?;
        }
        if let Some(value) = self.env_value("PUBLISHING_INTERVAL") {
            config.subscription.publishing_interval =
                self.parse_duration_var("PUBLISHING_INTERVAL", &value)?;
        }
        if let Some(value) = self.env_value("SAMPLING_INTERVAL") {
            config.subscription.sampling_interval =
                self.parse_duration_var("SAMPLING_INTERVAL", &value)?;
        }
        Ok(())
    }

    fn env_name(&self, key: &str) -> String {
        format!("{}_{}", self.env_prefix, key)
    }

    fn env_value(&self, key: &str) -> Option<String> {
        env::var(self.env_name(key)).ok()
    }

    fn parse_duration_var(&self, key: &str, value: &str) -> ConfigResult<Duration> {
        humantime::parse_duration(value.trim())
            .map_err(|e| ConfigError::invalid_env_var(self.env_name(key), e.to_string()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// YAML goes through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Loads configuration from a file with default loader settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ExplorerConfig> {
    ConfigLoader::new().load(path)
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
