//! Typed error taxonomy for caller-visible failures.
//!
//! Every failure crossing a component boundary is classified into one of
//! the closed set of [`ErrorCode`]s. Calling code inspects the code to
//! decide between redirecting to an interactive login
//! ([`ErrorCode::LoginRequired`]) and surfacing a technical error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of error codes surfaced to calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No usable credentials are held; an interactive login is needed.
    ///
    /// This is the one "expected" code: callers redirect rather than
    /// display an error.
    LoginRequired,
    /// The provider's discovery metadata could not be obtained.
    MetadataLookupFailed,
    /// The user dismissed the interactive authorization redirect.
    RedirectCancelled,
    /// The authorization request could not be sent.
    LoginRequestFailed,
    /// The authorization response was missing or malformed.
    LoginResponseFailed,
    /// The code-for-token exchange was rejected.
    TokenGrantFailed,
    /// The refresh-token exchange failed for a recoverable reason.
    TokenRenewalFailed,
    /// The provider has no end-session support configured.
    LogoutNotSupported,
    /// The end-session request failed.
    LogoutRequestFailed,
    /// The server rejected the presented access token outright.
    InvalidToken,
    /// The token lacks the scope the endpoint demands.
    InsufficientScope,
    /// The API could not be reached at the transport level.
    ApiNetworkError,
    /// The API answered with a non-success status.
    ApiResponseError,
    /// A failure with no more specific classification.
    GeneralUiError,
}

impl ErrorCode {
    /// Stable textual form of the code, as logged and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginRequired => "login_required",
            Self::MetadataLookupFailed => "metadata_lookup_failed",
            Self::RedirectCancelled => "redirect_cancelled",
            Self::LoginRequestFailed => "login_request_failed",
            Self::LoginResponseFailed => "login_response_failed",
            Self::TokenGrantFailed => "token_grant_failed",
            Self::TokenRenewalFailed => "token_renewal_failed",
            Self::LogoutNotSupported => "logout_not_supported",
            Self::LogoutRequestFailed => "logout_request_failed",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
            Self::ApiNetworkError => "api_network_error",
            Self::ApiResponseError => "api_response_error",
            Self::GeneralUiError => "general_ui_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, immutable after creation.
///
/// `Clone` matters here: a single-flight action broadcasts one error
/// value to every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Which taxonomy entry this failure belongs to.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// HTTP status of the failing response, when one was received.
    pub http_status: Option<u16>,
    /// Server-assigned correlation id extracted from the response body.
    pub instance_id: Option<String>,
    /// Underlying cause, rendered to text.
    pub details: Option<String>,
    /// URL of the failing call.
    pub url: Option<String>,
}

impl ApiError {
    /// Creates an error with a code and message and nothing else.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
            instance_id: None,
            details: None,
            url: None,
        }
    }

    /// The canonical "sign in again" error.
    #[must_use]
    pub fn login_required() -> Self {
        Self::new(ErrorCode::LoginRequired, "an interactive login is required")
    }

    /// Attaches the HTTP status of the failing response.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attaches the server-assigned correlation id.
    #[must_use]
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Attaches cause text.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches the URL of the failing call.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// True when calling code should redirect to an interactive login
    /// instead of reporting a technical failure.
    #[must_use]
    pub const fn is_login_required(&self) -> bool {
        matches!(self.code, ErrorCode::LoginRequired)
    }
}
