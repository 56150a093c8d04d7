//! End-to-end batch run: manifest in, JPEGs and manifest out

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::http::{FetchError, HttpClient};
use crate::manifest::{self, ManifestError};
use crate::observability::Metrics;
use crate::orchestrator::{BatchOrchestrator, BatchSummary};
use crate::processor::{ImageProcessor, Quality, UploadTarget};
use crate::server::{StatusServer, StatusState};
use crate::storage::{ObjectStoreUploader, UploadError};
use crate::tracker::StatusTracker;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error validating CSV: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JPEG quality {0}")]
    Quality(u8),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] FetchError),

    #[error("Failed to configure upload: {0}")]
    Upload(#[from] UploadError),

    #[error("Failed to start status server: {0}")]
    StatusServer(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Build the processor described by `config`, sharing `tracker` and `metrics`
pub fn build_processor(
    config: &Config,
    tracker: StatusTracker,
    metrics: Arc<Metrics>,
) -> Result<ImageProcessor> {
    let quality =
        Quality::new(config.transcode.quality).ok_or(PipelineError::Quality(config.transcode.quality))?;
    let client = HttpClient::new(config.http_config())?;

    let mut processor = ImageProcessor::new(client, &config.output.dir, quality)
        .with_tracker(tracker)
        .with_metrics(metrics);

    if config.upload.enabled {
        let uploader = ObjectStoreUploader::from_config(&config.upload)?;
        info!(bucket = %uploader.bucket, "Upload enabled");
        processor = processor.with_upload(UploadTarget {
            uploader: Arc::new(uploader),
            key_prefix: config.upload.key_prefix.clone(),
        });
    }

    Ok(processor)
}

async fn ensure_output_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PipelineError::OutputDir {
            path: dir.display().to_string(),
            source,
        })
}

/// Run one batch with the paths and settings in `config`.
///
/// Manifest errors abort before any image is fetched. Per-image failures
/// only show up in the output manifest and the returned summary.
pub async fn run_batch(config: &Config) -> Result<BatchSummary> {
    let rows = manifest::read_manifest(&config.input.manifest)?;
    ensure_output_dir(&config.output.dir).await?;

    let tracker = StatusTracker::new();
    let metrics = Arc::new(Metrics::new());
    let processor = build_processor(config, tracker.clone(), metrics.clone())?;

    let status_server = match config.status.bind_addr {
        Some(addr) => Some(
            StatusServer::spawn(addr, StatusState { tracker, metrics: metrics.clone() })
                .await
                .map_err(PipelineError::StatusServer)?,
        ),
        None => None,
    };

    info!(
        rows = rows.len(),
        quality = processor.quality().get(),
        output_dir = %config.output.dir.display(),
        "Starting batch"
    );

    let orchestrator = BatchOrchestrator::new(processor);
    let output = orchestrator.process_all(&rows).await;

    let written = manifest::write_manifest(&config.output.manifest, &output);
    if let Some(server) = status_server {
        server.shutdown().await;
    }
    written?;

    let summary = BatchSummary::from_rows(&output);
    info!(
        rows = summary.rows,
        images = summary.images,
        succeeded = summary.succeeded,
        failed = summary.failed,
        uploaded = metrics.snapshot().images_uploaded,
        "Batch finished"
    );

    Ok(summary)
}

/// Load and validate the input manifest without fetching anything
pub fn check_manifest(path: &Path) -> Result<usize> {
    let rows = manifest::read_manifest(path)?;
    let urls = rows.iter().map(|r| r.urls().len()).sum::<usize>();
    info!(rows = rows.len(), urls, "Manifest is valid");
    Ok(rows.len())
}
