use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use imgbatch::model::ProcessingState;
use imgbatch::observability::Metrics;
use imgbatch::server::{LookupResponse, StatusReport, StatusServer, StatusState, router};
use imgbatch::tracker::StatusTracker;

async fn seeded_state() -> StatusState {
    let tracker = StatusTracker::new();
    tracker.set("http://x/a.png", ProcessingState::Processed).await;
    tracker.set("http://x/b.png", ProcessingState::Processing).await;

    let metrics = Arc::new(Metrics::new());
    metrics.image_processed();

    StatusState { tracker, metrics }
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_health() {
    let app = router(seeded_state().await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_status_lists_all_urls() {
    let app = router(seeded_state().await);

    let response = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: StatusReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.images.len(), 2);
    assert_eq!(report.images["http://x/b.png"], ProcessingState::Processing);
    assert_eq!(report.counters.images_processed, 1);
}

#[tokio::test]
async fn test_lookup_known_and_unknown_url() {
    let state = seeded_state().await;

    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/status/lookup?url=http%3A%2F%2Fx%2Fa.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let found: LookupResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(found.url, "http://x/a.png");
    assert_eq!(found.state, ProcessingState::Processed);

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/status/lookup?url=http%3A%2F%2Fx%2Fnever.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let unknown: LookupResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(unknown.state, ProcessingState::Unprocessed);
}

#[tokio::test]
async fn test_lookup_requires_url() {
    let response = router(seeded_state().await)
        .oneshot(Request::builder().uri("/status/lookup").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spawned_server_sees_live_updates() {
    let state = seeded_state().await;
    let tracker = state.tracker.clone();
    let server = StatusServer::spawn("127.0.0.1:0".parse().unwrap(), state)
        .await
        .unwrap();

    tracker.set("http://x/c.png", ProcessingState::Failed).await;

    let url = format!("http://{}/status", server.local_addr);
    let body = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
    let report: StatusReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.images["http://x/c.png"], ProcessingState::Failed);

    server.shutdown().await;
}
