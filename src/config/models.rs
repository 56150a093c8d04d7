use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

/// Input manifest location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_input_manifest")]
    pub manifest: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            manifest: default_input_manifest(),
        }
    }
}

fn default_input_manifest() -> PathBuf {
    PathBuf::from("input.csv")
}

/// Output manifest and image directory
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            manifest: default_output_manifest(),
            dir: default_output_dir(),
        }
    }
}

fn default_output_manifest() -> PathBuf {
    PathBuf::from("output_images.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output_images")
}

/// JPEG re-encode settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// JPEG quality, 1..=95
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

fn default_quality() -> u8 {
    50
}

/// Outbound HTTP settings for image fetches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Total attempts per URL; 1 disables retry
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: ByteSize,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_body_bytes() -> ByteSize {
    ByteSize::mib(20)
}

/// Storage provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    S3,
    Local,
    Memory,
}

/// Remote upload of processed images (disabled unless `enabled = true`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: StorageProvider,
    #[serde(default)]
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    /// Root directory for the `local` provider
    pub local_root: Option<PathBuf>,
    /// Prefix for object keys; the JPEG file name is appended
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Overrides the URL reported for uploaded objects
    pub public_base_url: Option<String>,
    /// Loaded from environment, never from config file
    #[serde(skip)]
    pub access_key: Option<String>,
    #[serde(skip)]
    pub secret_key: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: StorageProvider::default(),
            bucket: String::new(),
            region: None,
            endpoint: None,
            local_root: None,
            key_prefix: default_key_prefix(),
            public_base_url: None,
            access_key: None,
            secret_key: None,
        }
    }
}

fn default_key_prefix() -> String {
    "output_images".to_string()
}

/// Optional progress endpoint served while a batch runs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusConfig {
    pub bind_addr: Option<SocketAddr>,
}
