//! The send-and-receive boundary.
//!
//! A [`Transport`] takes a [`ConcreteRequest`] and returns the raw response.
//! It knows nothing about envelopes; decoding happens in the
//! [`Client`](crate::Client). [`ReqwestTransport`] is the default.

use crate::{assembler::ConcreteRequest, assembler::DEFAULT_TIMEOUT, Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::time::{Duration, Instant};

/// A raw HTTP response as returned by a [`Transport`].
///
/// # Examples
///
/// ```
/// use netspec::TransportResponse;
/// use http::{HeaderMap, HeaderValue, StatusCode};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", HeaderValue::from_static("application/json"));
///
/// let response = TransportResponse::new(StatusCode::OK, headers, r#"{"code":1}"#);
/// assert!(response.is_success());
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// assert_eq!(response.text(), r#"{"code":1}"#);
/// ```
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body.
    pub body: Bytes,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl TransportResponse {
    /// Creates a response with zero latency.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            latency: Duration::ZERO,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends concrete requests.
///
/// Implementations must be cancel-safe: dropping the returned future abandons
/// the request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] or [`Error::Timeout`] when no response was
    /// received.
    async fn send(&self, request: ConcreteRequest) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport whose connect phase times out after 15 seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the HTTP client cannot be built.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ConcreteRequest) -> Result<TransportResponse> {
        let start_time = Instant::now();

        let mut builder = self
            .http_client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .timeout(request.timeout());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
            latency: start_time.elapsed(),
        })
    }
}
