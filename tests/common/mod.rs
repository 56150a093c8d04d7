//! Shared fixtures: an in-process image server and generated images

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

/// Chunks in a full `/chunked.png` response
pub const CHUNK_COUNT: usize = 128;
pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone)]
struct MockState {
    png: Bytes,
    hits: Arc<AtomicUsize>,
    chunks_served: Arc<AtomicUsize>,
}

/// Running image server
pub struct ImageServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    chunks_served: Arc<AtomicUsize>,
}

impl ImageServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Requests received so far, any route
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Body chunks produced by `/chunked.png` so far
    pub fn chunks_served(&self) -> usize {
        self.chunks_served.load(Ordering::SeqCst)
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 5 % 256) as u8, (y * 9 % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test png");
    bytes
}

async fn image(State(state): State<MockState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], state.png.clone())
}

async fn corrupt(State(state): State<MockState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], "definitely not a png")
}

async fn missing(State(state): State<MockState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, state.png.clone())
}

async fn slow(State(state): State<MockState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(3)).await;
    state.png.clone()
}

// No Content-Length: the body is streamed with chunked transfer encoding
async fn chunked(State(state): State<MockState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let counter = state.chunks_served.clone();
    let stream = futures::stream::unfold(0usize, move |sent| {
        let counter = counter.clone();
        async move {
            if sent >= CHUNK_COUNT {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Some((Ok::<_, std::io::Error>(Bytes::from(vec![0u8; CHUNK_SIZE])), sent + 1))
        }
    });
    Body::from_stream(stream)
}

/// Routes: `/a.png`, `/b.png` (valid PNG), `/corrupt.png` (200, garbage),
/// `/missing.png` (404 with a valid PNG body), `/slow.png` (3s delay),
/// `/chunked.png` (8MiB of zeros streamed without a length)
pub async fn start_image_server() -> ImageServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let chunks_served = Arc::new(AtomicUsize::new(0));
    let state = MockState {
        png: Bytes::from(png_bytes(48, 32)),
        hits: hits.clone(),
        chunks_served: chunks_served.clone(),
    };

    let app = Router::new()
        .route("/a.png", get(image))
        .route("/b.png", get(image))
        .route("/corrupt.png", get(corrupt))
        .route("/missing.png", get(missing))
        .route("/slow.png", get(slow))
        .route("/chunked.png", get(chunked))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server addr");

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("mock server");
    });

    ImageServer {
        base_url: format!("http://{addr}"),
        hits,
        chunks_served,
    }
}
