//! Outbound HTTP capability used by the metadata providers.
//!
//! Providers only see the `HttpClient` trait; `ReqwestClient` is the
//! production implementation and tests substitute a stub.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;

/// Reasons a metadata retrieval degraded.
///
/// These never propagate out of [`MetadataFetcher`](super::MetadataFetcher);
/// they are carried as the degradation reason of an
/// [`Enrichment`](super::Enrichment).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request or the overall retrieval budget ran out
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Body could not be decoded
    #[error("malformed response body: {0}")]
    Malformed(String),

    /// The endpoint URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No post ID could be extracted, so no request was made
    #[error("no post ID in URL")]
    MissingPostId,
}

/// A single GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub url: &'a str,
    pub headers: &'a [(&'a str, &'a str)],
    /// Budget for the whole exchange, body included.
    pub timeout: Duration,
    /// Bytes of body to keep; the rest is never read.
    pub max_body_bytes: usize,
}

/// Status and (possibly truncated) body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for outbound GET requests.
///
/// This trait enables stubbing in tests and keeps connection pooling, TLS
/// and transport retries out of the providers.
pub trait HttpClient: Send + Sync {
    /// Issues a GET and returns the status with at most
    /// `request.max_body_bytes` of body.
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, FetchError>;
}

/// Builder for constructing `ReqwestClient` instances.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vault::metadata::ReqwestClientBuilder;
///
/// let client = ReqwestClientBuilder::new()
///     .connect_timeout(Duration::from_secs(3))
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct ReqwestClientBuilder {
    connect_timeout: Option<Duration>,
}

impl ReqwestClientBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TCP connect timeout. Defaults to 5 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// The overall request timeout is set per request from the caller's
    /// remaining budget, not on the client.
    pub fn build(self) -> Result<ReqwestClient, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(self.connect_timeout.unwrap_or(Duration::from_secs(5)))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(ReqwestClient { client })
    }
}

/// Blocking reqwest implementation of [`HttpClient`].
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl HttpClient for ReqwestClient {
    fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(request.url).timeout(request.timeout);
        for (name, value) in request.headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        let mut body = Vec::new();
        response
            .take(request.max_body_bytes as u64)
            .read_to_end(&mut body)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut => FetchError::Timeout,
                _ => FetchError::Transport(e.to_string()),
            })?;

        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_builder() {
        FetchError::InvalidUrl(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}
