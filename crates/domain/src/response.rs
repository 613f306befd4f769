//! API response value types.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for a 2xx success status.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true for HTTP 401.
    #[must_use]
    pub const fn is_unauthorized(self) -> bool {
        self.0 == 401
    }

    /// Returns true for HTTP 403.
    #[must_use]
    pub const fn is_forbidden(self) -> bool {
        self.0 == 403
    }

    /// Returns true for a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// A raw API response: status, headers and body bytes.
///
/// Non-success statuses are represented here too; turning them into
/// typed errors is the classifier's job, not the transport's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers, lowercased names.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response, lowercasing header names for lookup.
    #[must_use]
    pub fn new(status: impl Into<StatusCode>, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status: status.into(),
            headers,
            body,
        }
    }

    /// Looks up a header value, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as lossily decoded text.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying decode error when the body is not valid
    /// JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_categories() {
        assert!(StatusCode::new(204).is_success());
        assert!(StatusCode::new(401).is_unauthorized());
        assert!(StatusCode::new(403).is_forbidden());
        assert!(StatusCode::new(502).is_server_error());
        assert!(!StatusCode::new(301).is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("WWW-Authenticate".to_string(), "Bearer".to_string());
        let response = ApiResponse::new(401, headers, Vec::new());

        assert_eq!(response.header("www-authenticate"), Some("Bearer"));
        assert_eq!(response.header("WWW-AUTHENTICATE"), Some("Bearer"));
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Payload {
            name: String,
        }

        let response = ApiResponse::new(200, HashMap::new(), br#"{"name":"ada"}"#.to_vec());
        let payload: Payload = response.json().unwrap();
        assert_eq!(payload.name, "ada");
    }

    #[test]
    fn test_json_body_invalid() {
        let response = ApiResponse::new(200, HashMap::new(), b"not json".to_vec());
        assert!(response.json::<serde_json::Value>().is_err());
    }
}
