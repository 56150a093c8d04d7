//! Configuration management for imgbatch
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use imgbatch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Writing JPEGs to: {}", config.output.dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `IMGBATCH__<section>__<key>`
//!
//! Examples:
//! - `IMGBATCH__TRANSCODE__QUALITY=70`
//! - `IMGBATCH__OUTPUT__DIR=/var/lib/imgbatch/images`
//! - `IMGBATCH__HTTP__MAX_BODY_BYTES=10MB`
//!
//! Upload credentials are read from `AMAZON_ACCESS_KEY` / `AMAZON_SECRET_KEY`
//! (or the AWS-style names) and never from the file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/imgbatch.toml`.
//! This can be overridden using the `IMGBATCH_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    Config, HttpSettings, InputConfig, OutputConfig, StatusConfig, StorageProvider,
    TranscodeConfig, UploadConfig,
};
pub use validation::ValidationError;

use crate::http::HttpConfig;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_with(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Layered configuration with an optional explicit file path, not yet
    /// validated. Call [`Config::validate`] once overrides are applied.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(sources::load(path)?)
    }

    /// Load configuration from a specific path, skipping `.env` and secrets
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-run validation after programmatic overrides (e.g. CLI flags)
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }

    /// Effective configuration as TOML; secrets are never serialized
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fetcher settings derived from the `[http]` section
    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            connect_timeout: Duration::from_millis(self.http.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.http.request_timeout_ms),
            max_attempts: self.http.max_attempts,
            retry_backoff: Duration::from_millis(self.http.retry_backoff_ms),
            max_body_bytes: self.http.max_body_bytes.as_usize(),
            user_agent: self.http.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[transcode]\nquality = 70\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.transcode.quality, 70);
    }

    #[test]
    fn test_validation_catches_bad_quality() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[transcode]\nquality = 100\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::QualityOutOfRange { actual: 100, .. })
        ));
    }

    #[test]
    fn test_out_of_range_file_value_can_be_overridden() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[transcode]\nquality = 0\n").unwrap();

        let mut config = Config::load_with(Some(&config_path)).unwrap();
        assert_eq!(config.transcode.quality, 0);
        assert!(config.validate().is_err());

        config.transcode.quality = 60;
        config.validate().unwrap();
    }

    #[test]
    fn test_http_config_conversion() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            r#"
[http]
connect_timeout_ms = 250
request_timeout_ms = 1500
max_attempts = 2
max_body_bytes = "1MB"
user_agent = "catalog-sync/2"
            "#,
        )
        .unwrap();

        let http = Config::load_from_path(config_path).unwrap().http_config();
        assert_eq!(http.connect_timeout, Duration::from_millis(250));
        assert_eq!(http.request_timeout, Duration::from_millis(1500));
        assert_eq!(http.max_attempts, 2);
        assert_eq!(http.max_body_bytes, 1024 * 1024);
        assert_eq!(http.user_agent, "catalog-sync/2");
    }

    #[test]
    fn test_to_toml_omits_secrets() {
        let mut config = Config::default();
        config.upload.access_key = Some("AKIA-secret".to_string());

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("quality = 50"));
        assert!(!rendered.contains("AKIA-secret"));
    }
}
