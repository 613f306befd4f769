//! Error classification.
//!
//! Total, pure mappings from transport, HTTP and authentication-library
//! failures into the closed [`ApiError`] taxonomy. Every input produces
//! exactly one typed error; nothing below this layer reaches callers
//! unclassified.

use beacon_domain::{ApiError, ApiResponse, ErrorCode};
use serde::Deserialize;

use crate::ports::{AuthLibraryError, HttpClientError};

/// Server-supplied error envelope, RFC 7807-flavoured.
///
/// Backends vary in which fields they set; everything is optional and
/// unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    #[serde(alias = "errorCode", alias = "code")]
    error_code: Option<String>,
    #[serde(alias = "instanceId", alias = "instance")]
    instance_id: Option<String>,
    #[serde(alias = "detail", alias = "error_description")]
    message: Option<String>,
}

/// Classifies a transport-level failure; no HTTP response was produced.
#[must_use]
pub fn from_transport_failure(error: &HttpClientError, url: &str) -> ApiError {
    ApiError::new(ErrorCode::ApiNetworkError, "the API could not be reached")
        .with_details(error.to_string())
        .with_url(url)
}

/// Classifies a non-success HTTP response.
///
/// 401 maps to [`ErrorCode::LoginRequired`], or
/// [`ErrorCode::InvalidToken`] when the server additionally signals
/// token rejection; 403 with a scope signal maps to
/// [`ErrorCode::InsufficientScope`]; everything else becomes an
/// [`ErrorCode::ApiResponseError`] carrying whatever the error envelope
/// supplied.
#[must_use]
pub fn from_http_response(response: &ApiResponse, url: &str) -> ApiError {
    let body = parse_error_body(&response.body);
    let status = response.status;

    let code = match status.as_u16() {
        401 if signals(response, &body, "invalid_token") => ErrorCode::InvalidToken,
        401 => ErrorCode::LoginRequired,
        403 if signals(response, &body, "insufficient_scope") => ErrorCode::InsufficientScope,
        _ => ErrorCode::ApiResponseError,
    };

    let message = body
        .message
        .clone()
        .unwrap_or_else(|| format!("API request failed with status {status}"));

    let mut error = ApiError::new(code, message)
        .with_status(status.as_u16())
        .with_url(url);
    if let Some(instance_id) = body.instance_id {
        error = error.with_instance_id(instance_id);
    }
    if let Some(server_code) = body.error_code {
        error = error.with_details(format!("server error code: {server_code}"));
    }
    error
}

/// Classifies a failure reported by the authentication library.
///
/// A renewal rejected with `invalid_grant` means the refresh token
/// itself is dead; that maps to [`ErrorCode::LoginRequired`] so calling
/// UI redirects to login instead of showing a technical error.
#[must_use]
pub fn from_auth_failure(error: &AuthLibraryError) -> ApiError {
    match error {
        AuthLibraryError::MetadataLookup { message } => ApiError::new(
            ErrorCode::MetadataLookupFailed,
            "authentication provider metadata could not be loaded",
        )
        .with_details(message.clone()),

        AuthLibraryError::RedirectCancelled => ApiError::new(
            ErrorCode::RedirectCancelled,
            "the sign-in redirect was cancelled",
        ),

        AuthLibraryError::LoginRequest { message } => {
            ApiError::new(ErrorCode::LoginRequestFailed, "the sign-in request failed")
                .with_details(message.clone())
        }

        AuthLibraryError::LoginResponse { message } => ApiError::new(
            ErrorCode::LoginResponseFailed,
            "the sign-in response was invalid",
        )
        .with_details(message.clone()),

        AuthLibraryError::TokenGrant { message } => ApiError::new(
            ErrorCode::TokenGrantFailed,
            "the authorization code could not be exchanged",
        )
        .with_details(message.clone()),

        AuthLibraryError::TokenRenewal {
            message,
            invalid_grant: true,
        } => ApiError::login_required().with_details(message.clone()),

        AuthLibraryError::TokenRenewal {
            message,
            invalid_grant: false,
        } => ApiError::new(
            ErrorCode::TokenRenewalFailed,
            "the access token could not be renewed",
        )
        .with_details(message.clone()),

        AuthLibraryError::LogoutNotSupported => ApiError::new(
            ErrorCode::LogoutNotSupported,
            "the provider does not support remote logout",
        ),

        AuthLibraryError::LogoutRequest { message } => {
            ApiError::new(ErrorCode::LogoutRequestFailed, "the logout request failed")
                .with_details(message.clone())
        }

        AuthLibraryError::Network { message } => ApiError::new(
            ErrorCode::ApiNetworkError,
            "the authentication provider could not be reached",
        )
        .with_details(message.clone()),
    }
}

/// Classifies a single-flight action that died without an outcome.
#[must_use]
pub fn from_single_flight_abort(key: &str) -> ApiError {
    ApiError::new(
        ErrorCode::GeneralUiError,
        format!("the '{key}' action was interrupted before completing"),
    )
}

fn parse_error_body(body: &[u8]) -> ErrorBody {
    serde_json::from_slice(body).unwrap_or_default()
}

/// True when the response carries `marker` in its error envelope or its
/// `WWW-Authenticate` challenge (RFC 6750 bearer error signalling).
fn signals(response: &ApiResponse, body: &ErrorBody, marker: &str) -> bool {
    if body.error_code.as_deref() == Some(marker) {
        return true;
    }
    response
        .header("www-authenticate")
        .is_some_and(|challenge| challenge.contains(marker))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse::new(status, HashMap::new(), body.as_bytes().to_vec())
    }

    #[test]
    fn test_transport_failure_maps_to_network_error() {
        let error = from_transport_failure(
            &HttpClientError::Timeout { timeout_ms: 30_000 },
            "https://api.example.com/items",
        );

        assert_eq!(error.code, ErrorCode::ApiNetworkError);
        assert_eq!(error.url.as_deref(), Some("https://api.example.com/items"));
        assert!(error.details.unwrap().contains("timed out"));
    }

    #[test]
    fn test_plain_401_maps_to_login_required() {
        let error = from_http_response(&response(401, ""), "https://api.example.com/me");
        assert_eq!(error.code, ErrorCode::LoginRequired);
        assert_eq!(error.http_status, Some(401));
    }

    #[test]
    fn test_401_with_invalid_token_signal() {
        let error = from_http_response(
            &response(401, r#"{"errorCode":"invalid_token"}"#),
            "https://api.example.com/me",
        );
        assert_eq!(error.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn test_401_with_www_authenticate_challenge() {
        let mut headers = HashMap::new();
        headers.insert(
            "WWW-Authenticate".to_string(),
            r#"Bearer error="invalid_token", error_description="expired""#.to_string(),
        );
        let response = ApiResponse::new(401, headers, Vec::new());

        let error = from_http_response(&response, "https://api.example.com/me");
        assert_eq!(error.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn test_403_with_scope_signal() {
        let error = from_http_response(
            &response(403, r#"{"code":"insufficient_scope"}"#),
            "https://api.example.com/admin",
        );
        assert_eq!(error.code, ErrorCode::InsufficientScope);
    }

    #[test]
    fn test_server_error_extracts_envelope() {
        let error = from_http_response(
            &response(
                500,
                r#"{"errorCode":"E-1042","instanceId":"inst-77","detail":"backend exploded"}"#,
            ),
            "https://api.example.com/items",
        );

        assert_eq!(error.code, ErrorCode::ApiResponseError);
        assert_eq!(error.http_status, Some(500));
        assert_eq!(error.instance_id.as_deref(), Some("inst-77"));
        assert_eq!(error.message, "backend exploded");
        assert_eq!(error.details.as_deref(), Some("server error code: E-1042"));
    }

    #[test]
    fn test_non_json_body_still_classifies() {
        let error = from_http_response(
            &response(503, "<html>Service Unavailable</html>"),
            "https://api.example.com/items",
        );
        assert_eq!(error.code, ErrorCode::ApiResponseError);
        assert_eq!(error.http_status, Some(503));
    }

    #[test]
    fn test_invalid_grant_renewal_maps_to_login_required() {
        let error = from_auth_failure(&AuthLibraryError::TokenRenewal {
            message: "invalid_grant".to_string(),
            invalid_grant: true,
        });
        assert!(error.is_login_required());
    }

    #[test]
    fn test_recoverable_renewal_keeps_renewal_code() {
        let error = from_auth_failure(&AuthLibraryError::TokenRenewal {
            message: "server_error".to_string(),
            invalid_grant: false,
        });
        assert_eq!(error.code, ErrorCode::TokenRenewalFailed);
    }

    #[test]
    fn test_every_auth_cause_classifies() {
        let causes = [
            AuthLibraryError::MetadataLookup { message: "m".to_string() },
            AuthLibraryError::RedirectCancelled,
            AuthLibraryError::LoginRequest { message: "m".to_string() },
            AuthLibraryError::LoginResponse { message: "m".to_string() },
            AuthLibraryError::TokenGrant { message: "m".to_string() },
            AuthLibraryError::LogoutNotSupported,
            AuthLibraryError::LogoutRequest { message: "m".to_string() },
            AuthLibraryError::Network { message: "m".to_string() },
        ];
        let expected = [
            ErrorCode::MetadataLookupFailed,
            ErrorCode::RedirectCancelled,
            ErrorCode::LoginRequestFailed,
            ErrorCode::LoginResponseFailed,
            ErrorCode::TokenGrantFailed,
            ErrorCode::LogoutNotSupported,
            ErrorCode::LogoutRequestFailed,
            ErrorCode::ApiNetworkError,
        ];

        for (cause, code) in causes.iter().zip(expected) {
            assert_eq!(from_auth_failure(cause).code, code);
        }
    }

    #[test]
    fn test_single_flight_abort_classifies() {
        let error = from_single_flight_abort("refresh");
        assert_eq!(error.code, ErrorCode::GeneralUiError);
        assert!(error.message.contains("refresh"));
    }
}
