//! Fetch-transcode unit: one URL in, one [`OutputResult`] out
//!
//! `process` never returns an error. Every failure is logged with the
//! offending URL, recorded as `Failed` in the tracker and surfaced as
//! [`OutputResult::Failure`].

use bytes::Bytes;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::{FetchError, HttpClient};
use crate::model::{OutputResult, ProcessingState, Reference};
use crate::observability::Metrics;
use crate::storage::ObjectUploader;
use crate::tracker::StatusTracker;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("transcode task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// JPEG quality in `MIN..=MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 95;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(50)
    }
}

/// Remote upload step applied after the local save
#[derive(Clone)]
pub struct UploadTarget {
    pub uploader: Arc<dyn ObjectUploader>,
    pub key_prefix: String,
}

impl UploadTarget {
    fn key_for(&self, path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        }
    }
}

pub struct ImageProcessor {
    client: HttpClient,
    output_dir: PathBuf,
    quality: Quality,
    tracker: StatusTracker,
    metrics: Arc<Metrics>,
    upload: Option<UploadTarget>,
}

impl ImageProcessor {
    pub fn new(client: HttpClient, output_dir: impl Into<PathBuf>, quality: Quality) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            quality,
            tracker: StatusTracker::new(),
            metrics: Arc::new(Metrics::new()),
            upload: None,
        }
    }

    pub fn with_tracker(mut self, tracker: StatusTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_upload(mut self, upload: UploadTarget) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Fetch, re-encode and store one image
    pub async fn process(&self, url: &str) -> OutputResult {
        self.tracker.set(url, ProcessingState::Processing).await;

        match self.fetch_and_save(url).await {
            Ok(path) => {
                self.tracker.set(url, ProcessingState::Processed).await;
                self.metrics.image_processed();
                OutputResult::Success(self.publish(path).await)
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to process image");
                self.tracker.set(url, ProcessingState::Failed).await;
                self.metrics.image_failed();
                OutputResult::Failure
            }
        }
    }

    async fn fetch_and_save(&self, url: &str) -> Result<PathBuf> {
        let body = self.client.fetch(url).await?;
        let jpeg = transcode(body, self.quality).await?;

        let path = self.output_dir.join(format!("{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, &jpeg).await?;

        info!(url, path = %path.display(), size = jpeg.len(), "Saved image");
        Ok(path)
    }

    /// Upload when configured; the local file stays the reference on failure
    async fn publish(&self, path: PathBuf) -> Reference {
        let Some(target) = &self.upload else {
            return Reference::Local(path);
        };

        let key = target.key_for(&path);
        match target.uploader.upload(&path, &key).await {
            Ok(meta) => {
                debug!(key = %meta.key, etag = ?meta.etag, size = meta.size, "Uploaded image");
                self.metrics.image_uploaded();
                Reference::Remote(meta.public_url)
            }
            Err(e) => {
                warn!(path = %path.display(), key, error = %e, "Upload failed, keeping local file");
                Reference::Local(path)
            }
        }
    }
}

/// Decode `body` as any supported image and re-encode it as JPEG.
///
/// Runs on the blocking pool so a large image cannot stall the runtime.
pub async fn transcode(body: Bytes, quality: Quality) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || encode_jpeg(&body, quality)).await?
}

fn encode_jpeg(body: &[u8], quality: Quality) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(body).map_err(ProcessError::Decode)?;
    // JPEG has no alpha channel
    let rgb = decoded.to_rgb8();
    debug!(width = rgb.width(), height = rgb.height(), "Decoded image");

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.get())
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(ProcessError::Encode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 200])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_quality_range() {
        assert!(Quality::new(0).is_none());
        assert!(Quality::new(96).is_none());
        assert_eq!(Quality::new(1).unwrap().get(), 1);
        assert_eq!(Quality::new(95).unwrap().get(), 95);
        assert_eq!(Quality::default().get(), 50);
    }

    #[tokio::test]
    async fn test_transcode_png_with_alpha_to_jpeg() {
        let jpeg = transcode(Bytes::from(png_bytes(32, 24)), Quality::default())
            .await
            .unwrap();

        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[tokio::test]
    async fn test_higher_quality_yields_larger_file() {
        let png = Bytes::from(png_bytes(64, 64));
        let low = transcode(png.clone(), Quality::new(10).unwrap()).await.unwrap();
        let high = transcode(png, Quality::new(95).unwrap()).await.unwrap();

        assert!(high.len() > low.len());
    }

    #[tokio::test]
    async fn test_transcode_rejects_garbage() {
        let err = transcode(Bytes::from_static(b"<html>not an image</html>"), Quality::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Decode(_)));
    }

    #[test]
    fn test_upload_key_uses_prefix_and_file_name() {
        let target = UploadTarget {
            uploader: Arc::new(crate::storage::ObjectStoreUploader::in_memory("b")),
            key_prefix: "/output_images/".to_string(),
        };
        assert_eq!(
            target.key_for(Path::new("/data/out/abc.jpg")),
            "output_images/abc.jpg"
        );
    }

    #[tokio::test]
    async fn test_unreachable_url_fails_and_marks_tracker() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = HttpClient::new(crate::http::HttpConfig::default()).unwrap();
        let processor = ImageProcessor::new(client, dir.path(), Quality::default());

        let result = processor.process("not-a-url").await;

        assert_eq!(result, OutputResult::Failure);
        assert_eq!(processor.tracker().get("not-a-url").await, ProcessingState::Failed);
        assert_eq!(processor.metrics().snapshot().images_failed, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
