//! Token material returned by the authentication library.

use serde::{Deserialize, Serialize};

/// Tokens obtained from an interactive login, a code exchange or a
/// refresh-token exchange.
///
/// This mirrors the token endpoint's response shape; the coordinator
/// turns it into an [`crate::AuthState`] snapshot using the clock's
/// current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The new access token.
    pub access_token: String,
    /// A refresh token, when the server rotated or issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// An OpenID Connect identity token, when issued.
    #[serde(default)]
    pub id_token: Option<String>,
    /// Seconds until the access token expires, counted from issuance.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Space-separated scope actually granted.
    #[serde(default)]
    pub scope: String,
}

impl TokenGrant {
    /// Creates a grant carrying only an access token and its lifetime.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            id_token: None,
            expires_in: Some(expires_in),
            scope: String::new(),
        }
    }

    /// Attaches a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attaches an identity token.
    #[must_use]
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    /// Sets the granted scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let grant = TokenGrant::new("at", 120)
            .with_refresh_token("rt")
            .with_scope("api");

        assert_eq!(grant.access_token, "at");
        assert_eq!(grant.refresh_token.as_deref(), Some("rt"));
        assert_eq!(grant.expires_in, Some(120));
        assert_eq!(grant.scope, "api");
        assert_eq!(grant.id_token, None);
    }

    #[test]
    fn test_deserializes_minimal_response() {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.expires_in, None);
        assert_eq!(grant.scope, "");
    }
}
