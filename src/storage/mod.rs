//! Optional upload of processed images to object storage
//!
//! Off by default. When `upload.enabled` is set, the processor hands every
//! saved JPEG to an [`ObjectUploader`] and reports the object's public URL
//! instead of the local path.

use async_trait::async_trait;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageProvider, UploadConfig};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Local file not found: {0}")]
    MissingFile(String),

    #[error("Failed to read local file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Upload misconfigured: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, UploadError>;

/// Metadata returned after upload
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
    pub public_url: String,
}

/// Capability for pushing a saved file to remote storage
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<UploadMetadata>;
}

/// [`ObjectUploader`] over any `object_store` backend
#[derive(Clone)]
pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    pub bucket: String,
    public_base_url: String,
}

impl ObjectStoreUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, public_base_url: String) -> Self {
        Self {
            store,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// In-memory store for testing/development
    pub fn in_memory(bucket: &str) -> Self {
        Self::new(
            Arc::new(object_store::memory::InMemory::new()),
            bucket.to_string(),
            format!("memory://{bucket}"),
        )
    }

    /// Build the backend named by the upload configuration
    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        let bucket = config.bucket.clone();

        let (store, default_base): (Arc<dyn ObjectStore>, String) = match config.provider {
            StorageProvider::S3 => {
                let mut builder = object_store::aws::AmazonS3Builder::new().with_bucket_name(&bucket);
                if let Some(region) = &config.region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let (Some(access), Some(secret)) = (&config.access_key, &config.secret_key) {
                    builder = builder
                        .with_access_key_id(access)
                        .with_secret_access_key(secret);
                }
                (
                    Arc::new(builder.build()?),
                    format!("https://{bucket}.s3.amazonaws.com"),
                )
            }
            StorageProvider::Local => {
                let root = config.local_root.as_ref().ok_or_else(|| {
                    UploadError::Config("local provider requires upload.local_root".to_string())
                })?;
                std::fs::create_dir_all(root)?;
                let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;
                (Arc::new(store), format!("file://{}", root.display()))
            }
            StorageProvider::Memory => (
                Arc::new(object_store::memory::InMemory::new()),
                format!("memory://{bucket}"),
            ),
        };

        let base = config.public_base_url.clone().unwrap_or(default_base);
        Ok(Self::new(store, bucket, base))
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.store.head(&StoragePath::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectUploader for ObjectStoreUploader {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<UploadMetadata> {
        let data = tokio::fs::read(local_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => UploadError::MissingFile(local_path.display().to_string()),
            _ => UploadError::Io(e),
        })?;
        let size = data.len();

        let put_result = self
            .store
            .put(&StoragePath::from(remote_key), data.into())
            .await?;

        tracing::info!(key = remote_key, bucket = %self.bucket, size, "Uploaded to storage");

        Ok(UploadMetadata {
            key: remote_key.to_string(),
            etag: put_result.e_tag,
            size,
            public_url: self.public_url(remote_key),
        })
    }
}
