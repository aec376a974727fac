use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use thiserror::Error;
use url::Url;

/// Shown for requests that never produced a response. From the client side a
/// relay/CORS rejection and an outage look the same, so both are named.
pub const NETWORK_FAILURE_MESSAGE: &str = "Network Error: The request did not receive a response. \
This is often due to CORS (Cross-Origin Resource Sharing) restrictions on the API or a loss of internet connection.";

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Request timed out after {}", format_limit(.0))]
    Timeout(Duration),
    #[error("fetch failed: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Message placed in the `error` field of a failed result.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Network(_) => NETWORK_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<RawResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url} ({e})")))?;

        let mut request = self
            .client
            .get(parsed)
            .header(header::ACCEPT, "application/json")
            .header(
                header::USER_AGENT,
                concat!("apilab/", env!("CARGO_PKG_VERSION")),
            );
        if let Some(limit) = timeout {
            request = request.timeout(limit);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, timeout: Option<Duration>) -> TransportError {
    if e.is_timeout() {
        return TransportError::Timeout(timeout.unwrap_or_default());
    }
    if e.is_connect() || e.is_request() {
        return TransportError::Network(e.to_string());
    }
    TransportError::Other(e.to_string())
}

fn format_limit(limit: &Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{} s", limit.as_secs())
    } else {
        format!("{} ms", limit.as_millis())
    }
}
