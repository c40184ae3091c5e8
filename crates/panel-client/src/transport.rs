//! Transport seam between the client facade and the wire
//!
//! The facade never talks HTTP directly; it goes through [`Transport`],
//! which answers with raw status + body or a transport-level failure.
//! [`HttpTransport`] is the reqwest-backed production implementation:
//! it attaches the panel auth key to every request, enforces the
//! per-request timeout, and performs a bounded retry on transport-level
//! failures only (HTTP error statuses are never retried here; that
//! policy belongs to the caller).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Request timeout applied when the configuration leaves it unset or
/// non-positive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded transport-level retry before a failure is surfaced.
const RETRY_ATTEMPTS: u32 = 3;

/// Pause between transport-level retry attempts.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// A failure below the HTTP layer: the request produced no response.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// Raw outcome of one exchange: status code plus body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The "send request, get bytes or error" primitive the facade builds on.
///
/// Implementations must be safe for concurrent read-only use; the facade
/// holds no locks around them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` (which may carry a query string) relative to the panel
    /// base address.
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;

    /// POST a JSON body to `path` relative to the panel base address.
    async fn post_json(&self, path: &str, body: Vec<u8>) -> Result<RawResponse, TransportError>;
}

/// Production transport over reqwest.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport talking to `base_url`, sending `auth_key` as the
    /// `Authorization` header on every request.
    pub fn new(base_url: Url, auth_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(auth_key).map_err(TransportError::new)?;
        headers.insert(AUTHORIZATION, key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn join(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url.join(path).map_err(TransportError::new)
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse, TransportError> {
        let mut last_err = None;
        for attempt in 1..=RETRY_ATTEMPTS {
            // Bodies are always in-memory byte buffers, so the clone only
            // fails for a request kind this transport never builds.
            let Some(request) = request.try_clone() else {
                break;
            };
            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.bytes().await?.to_vec();
                    return Ok(RawResponse { status, body });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "panel request attempt failed");
                    last_err = Some(TransportError::from(err));
                    if attempt < RETRY_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            TransportError::new("request could not be cloned for retry".to_string())
        }))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let url = self.join(path)?;
        self.execute(self.client.get(url)).await
    }

    async fn post_json(&self, path: &str, body: Vec<u8>) -> Result<RawResponse, TransportError> {
        let url = self.join(path)?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.execute(request).await
    }
}
