//! Logging setup and batch counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters updated as images and rows complete
#[derive(Debug, Default)]
pub struct Metrics {
    images_processed: AtomicU64,
    images_failed: AtomicU64,
    images_uploaded: AtomicU64,
    rows_completed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_processed(&self) {
        self.images_processed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "images_processed", "Metric incremented");
    }

    pub fn image_failed(&self) {
        self.images_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "images_failed", "Metric incremented");
    }

    pub fn image_uploaded(&self) {
        self.images_uploaded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "images_uploaded", "Metric incremented");
    }

    pub fn row_completed(&self) {
        self.rows_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            images_processed: self.images_processed.load(Ordering::Relaxed),
            images_failed: self.images_failed.load(Ordering::Relaxed),
            images_uploaded: self.images_uploaded.load(Ordering::Relaxed),
            rows_completed: self.rows_completed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub images_processed: u64,
    pub images_failed: u64,
    pub images_uploaded: u64,
    pub rows_completed: u64,
}
