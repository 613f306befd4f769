//! HTTP transport port.

use std::future::Future;

use beacon_domain::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Transport-level failures, raised only when no HTTP response was
/// produced at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    /// The per-call timeout elapsed.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL did not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// A non-2xx status is not an error at this level; only transport
/// failures are. Status handling belongs to the executor and the
/// classifier.
pub trait HttpClient: Send + Sync {
    /// Executes a request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error when the request could not be completed at the
    /// transport level (timeout, connection failure, malformed URL).
    fn execute(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, HttpClientError>> + Send;
}
