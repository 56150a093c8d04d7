//! Per-URL processing state for one batch

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::ProcessingState;

/// Shared handle to the URL → state map.
///
/// Cloning is cheap and every clone sees the same map. A fresh tracker is
/// created per batch; entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    states: Arc<RwLock<HashMap<String, ProcessingState>>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `url`, `Unprocessed` if never touched
    pub async fn get(&self, url: &str) -> ProcessingState {
        self.states
            .read()
            .await
            .get(url)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, url: &str, state: ProcessingState) {
        self.states.write().await.insert(url.to_string(), state);
        tracing::debug!(url, %state, "Status updated");
    }

    /// Copy of every tracked entry
    pub async fn snapshot(&self) -> HashMap<String, ProcessingState> {
        self.states.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}
