//! HTTP client for fetching source images

use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Total attempts per URL, 1 means no retry
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_attempts: 1,
            retry_backoff: Duration::from_millis(500),
            max_body_bytes: 20 * 1024 * 1024,
            user_agent: concat!("imgbatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Image downloader
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Fetch a URL, retrying up to `max_attempts` with linear backoff
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.fetch_once(url).await {
                Ok(bytes) => {
                    if attempts > 1 {
                        debug!(url, attempts, "Fetch succeeded after retry");
                    }
                    return Ok(bytes);
                }
                Err(e) if attempts >= self.config.max_attempts || !is_retryable(&e) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(url, attempts, error = %e, "Fetch failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff * attempts).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Bytes> {
        debug!(url, "Starting fetch");

        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let mut response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::BodyTooLarge { limit });
        }

        // Chunked bodies carry no length up front; stop as soon as the cap is crossed
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::RequestFailed(format!("Failed to read body: {e}"))
            }
        })? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        debug!(url, size = bytes.len(), "Fetch completed");
        Ok(bytes)
    }
}

/// Client errors and malformed URLs will not improve on a second try
fn is_retryable(error: &FetchError) -> bool {
    match error {
        FetchError::Status { status, .. } => *status >= 500 || *status == 429,
        FetchError::InvalidUrl(_) | FetchError::BodyTooLarge { .. } => false,
        FetchError::RequestFailed(_) | FetchError::Timeout => true,
    }
}
