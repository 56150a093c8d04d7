//! Optional HTTP status endpoint served alongside a running batch

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::model::ProcessingState;
use crate::observability::{Metrics, MetricsSnapshot};
use crate::tracker::StatusTracker;

#[derive(Clone)]
pub struct StatusState {
    pub tracker: StatusTracker,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub counters: MetricsSnapshot,
    pub images: BTreeMap<String, ProcessingState>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub url: String,
    pub state: ProcessingState,
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/status/lookup", get(lookup))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<StatusState>) -> Json<StatusReport> {
    Json(StatusReport {
        counters: state.metrics.snapshot(),
        images: state.tracker.snapshot().await.into_iter().collect(),
    })
}

async fn lookup(
    State(state): State<StatusState>,
    Query(query): Query<LookupQuery>,
) -> Json<LookupResponse> {
    let current = state.tracker.get(&query.url).await;
    Json(LookupResponse {
        url: query.url,
        state: current,
    })
}

/// Running status server; dropped or shut down when the batch ends
pub struct StatusServer {
    pub local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StatusServer {
    pub async fn spawn(address: SocketAddr, state: StatusState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();

        let app = router(state);
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.await;
            };
            if let Err(e) = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(error = %e, "Status server stopped with error");
            }
        });

        info!(address = %local_addr, "Status server listening");
        Ok(Self {
            local_addr,
            shutdown: Some(tx),
            task,
        })
    }

    pub async fn shutdown(self) {
        let Self { shutdown, task, .. } = self;
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
        if let Err(e) = task.await {
            warn!(error = %e, "Status server task failed");
        }
        info!("Status server stopped");
    }
}
