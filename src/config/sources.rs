use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "IMGBATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/imgbatch.toml";
const ENV_PREFIX: &str = "IMGBATCH";
const ENV_SEPARATOR: &str = "__";

/// Credential variable pairs, checked in order
const CREDENTIAL_VARS: [(&str, &str); 2] = [
    ("AMAZON_ACCESS_KEY", "AMAZON_SECRET_KEY"),
    ("AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"),
];

/// Resolve the config file path: explicit argument, then `IMGBATCH_CONFIG`,
/// then the default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path(explicit))?;
    load_secrets(&mut config);

    Ok(config)
}

/// Upload credentials come from the environment only
fn load_secrets(config: &mut Config) {
    for (access_var, secret_var) in CREDENTIAL_VARS {
        if config.upload.access_key.is_none() {
            config.upload.access_key = env::var(access_var).ok();
        }
        if config.upload.secret_key.is_none() {
            config.upload.secret_key = env::var(secret_var).ok();
        }
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // IMGBATCH__TRANSCODE__QUALITY -> transcode.quality
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
