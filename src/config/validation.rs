use super::models::{Config, StorageProvider};
use crate::processor::Quality;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transcode.quality must be between {min} and {max}, got {actual}")]
    QualityOutOfRange { actual: u8, min: u8, max: u8 },

    #[error("http.{field} must be positive")]
    ZeroHttpSetting { field: &'static str },

    #[error("upload is enabled but upload.bucket is empty")]
    MissingBucket,

    #[error("upload provider is local but upload.local_root is not set")]
    MissingLocalRoot,

    #[error("upload provider is S3 but missing credentials (access_key or secret_key)")]
    MissingS3Credentials,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_transcode(config)?;
    validate_http(config)?;
    validate_upload(config)?;
    Ok(())
}

fn validate_transcode(config: &Config) -> Result<(), ValidationError> {
    let actual = config.transcode.quality;
    if Quality::new(actual).is_none() {
        return Err(ValidationError::QualityOutOfRange {
            actual,
            min: Quality::MIN,
            max: Quality::MAX,
        });
    }
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    let http = &config.http;
    let checks = [
        ("connect_timeout_ms", http.connect_timeout_ms == 0),
        ("request_timeout_ms", http.request_timeout_ms == 0),
        ("max_attempts", http.max_attempts == 0),
        ("max_body_bytes", http.max_body_bytes.as_u64() == 0),
    ];

    match checks.into_iter().find(|(_, is_zero)| *is_zero) {
        Some((field, _)) => Err(ValidationError::ZeroHttpSetting { field }),
        None => Ok(()),
    }
}

/// Upload settings only matter once the upload path is switched on
fn validate_upload(config: &Config) -> Result<(), ValidationError> {
    let upload = &config.upload;
    if !upload.enabled {
        return Ok(());
    }

    if upload.bucket.trim().is_empty() {
        return Err(ValidationError::MissingBucket);
    }

    match upload.provider {
        StorageProvider::S3 if upload.access_key.is_none() || upload.secret_key.is_none() => {
            Err(ValidationError::MissingS3Credentials)
        }
        StorageProvider::Local if upload.local_root.is_none() => {
            Err(ValidationError::MissingLocalRoot)
        }
        _ => Ok(()),
    }
}
