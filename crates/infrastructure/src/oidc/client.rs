//! OIDC token-endpoint client.
//!
//! Implements the `AuthLibrary` port: refresh-token and
//! authorization-code exchanges against the provider's token endpoint,
//! and the interactive flows assembled from the redirect boundary plus a
//! code exchange.

use base64::Engine;
use beacon_application::ports::{AuthFuture, AuthLibrary, AuthLibraryError, LogoutFuture};
use beacon_domain::TokenGrant;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{RedirectError, RedirectFlow};

/// Content type of token-endpoint request bodies.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Which grant a token request carries; decides how a rejection is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantKind {
    AuthorizationCode,
    RefreshToken,
}

/// Token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Token endpoint error response, RFC 6749 §5.2.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Static configuration of the provider endpoints.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Authorization endpoint, where the interactive login starts.
    pub authorize_url: Url,
    /// Token endpoint, for code and refresh-token exchanges.
    pub token_url: Url,
    /// End-session endpoint; `None` when the provider has none.
    pub end_session_url: Option<Url>,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret for confidential clients.
    pub client_secret: Option<String>,
    /// Redirect URI registered for this client.
    pub redirect_uri: String,
    /// Space-separated scope requested at login.
    pub scope: String,
}

/// `AuthLibrary` implementation speaking to an OIDC provider.
pub struct OidcAuthClient<R> {
    config: OidcConfig,
    http: reqwest::Client,
    redirect: R,
}

impl<R: RedirectFlow> OidcAuthClient<R> {
    /// Creates a client for the configured provider.
    #[must_use]
    pub fn new(config: OidcConfig, redirect: R) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            redirect,
        }
    }

    /// The authorization URL the interactive login opens.
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope);
        url
    }

    /// The end-session URL for the held identity token, when supported.
    #[must_use]
    pub fn end_session_url(&self, id_token: Option<&str>) -> Option<Url> {
        let mut url = self.config.end_session_url.clone()?;
        if let Some(id_token) = id_token {
            url.query_pairs_mut().append_pair("id_token_hint", id_token);
        }
        Some(url)
    }

    async fn token_request(
        &self,
        kind: GrantKind,
        params: &[(&str, &str)],
    ) -> Result<TokenGrant, AuthLibraryError> {
        let mut builder = self
            .http
            .post(self.config.token_url.clone())
            .header("Content-Type", FORM_CONTENT_TYPE)
            .form(params);

        // Confidential clients authenticate with HTTP Basic; public
        // clients send only their id, carried in the form params.
        if let Some(secret) = &self.config.client_secret {
            let credentials = format!("{}:{secret}", self.config.client_id);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
            builder = builder.header("Authorization", format!("Basic {encoded}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|error| AuthLibraryError::Network {
                message: error.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| AuthLibraryError::Network {
                message: format!("failed to read token response: {error}"),
            })?;

        if !status.is_success() {
            return Err(map_token_error(kind, &body));
        }

        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(|error| AuthLibraryError::Network {
                message: format!("failed to parse token response: {error}"),
            })?;

        debug!(grant = ?kind, "token endpoint exchange succeeded");
        Ok(TokenGrant {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            id_token: token.id_token,
            expires_in: token.expires_in,
            scope: token.scope.unwrap_or_default(),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthLibraryError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.token_request(GrantKind::AuthorizationCode, &params)
            .await
    }
}

/// Maps a token endpoint rejection to its library failure cause.
fn map_token_error(kind: GrantKind, body: &[u8]) -> AuthLibraryError {
    let (error, description) = serde_json::from_slice::<TokenErrorResponse>(body).map_or_else(
        |_| {
            (
                "unknown".to_string(),
                String::from_utf8_lossy(body).into_owned(),
            )
        },
        |parsed| {
            let description = parsed.error_description.unwrap_or_default();
            (parsed.error, description)
        },
    );

    let message = if description.is_empty() {
        error.clone()
    } else {
        format!("{error}: {description}")
    };

    match kind {
        GrantKind::AuthorizationCode => AuthLibraryError::TokenGrant { message },
        GrantKind::RefreshToken => AuthLibraryError::TokenRenewal {
            message,
            // RFC 6749 §5.2: invalid_grant covers an invalid, expired or
            // revoked refresh token.
            invalid_grant: error == "invalid_grant",
        },
    }
}

impl<R: RedirectFlow> AuthLibrary for OidcAuthClient<R> {
    fn exchange_authorization_code<'a>(&'a self, code: &'a str) -> AuthFuture<'a> {
        Box::pin(self.exchange_code(code))
    }

    fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> AuthFuture<'a> {
        Box::pin(async move {
            let params = [
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
            ];
            self.token_request(GrantKind::RefreshToken, &params).await
        })
    }

    fn begin_interactive_login(&self) -> AuthFuture<'_> {
        Box::pin(async move {
            let code = self
                .redirect
                .authorize(self.authorization_url())
                .await
                .map_err(|error| match error {
                    RedirectError::Cancelled => AuthLibraryError::RedirectCancelled,
                    RedirectError::Failed(message) => AuthLibraryError::LoginRequest { message },
                })?;

            if code.is_empty() {
                return Err(AuthLibraryError::LoginResponse {
                    message: "redirect delivered no authorization code".to_string(),
                });
            }

            self.exchange_code(&code).await
        })
    }

    fn begin_interactive_logout<'a>(&'a self, id_token: Option<&'a str>) -> LogoutFuture<'a> {
        Box::pin(async move {
            let Some(url) = self.end_session_url(id_token) else {
                return Err(AuthLibraryError::LogoutNotSupported);
            };

            self.redirect
                .end_session(url)
                .await
                .map_err(|error| AuthLibraryError::LogoutRequest {
                    message: error.to_string(),
                })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct NoBrowser;

    impl RedirectFlow for NoBrowser {
        async fn authorize(&self, _authorize_url: Url) -> Result<String, RedirectError> {
            Err(RedirectError::Cancelled)
        }

        async fn end_session(&self, _end_session_url: Url) -> Result<(), RedirectError> {
            Ok(())
        }
    }

    fn config(end_session: Option<&str>) -> OidcConfig {
        OidcConfig {
            authorize_url: Url::parse("https://idp.example.com/authorize").unwrap(),
            token_url: Url::parse("https://idp.example.com/token").unwrap(),
            end_session_url: end_session.map(|url| Url::parse(url).unwrap()),
            client_id: "beacon-mobile".to_string(),
            client_secret: None,
            redirect_uri: "beacon://callback".to_string(),
            scope: "openid profile api".to_string(),
        }
    }

    #[test]
    fn test_authorization_url_carries_oauth_params() {
        let client = OidcAuthClient::new(config(None), NoBrowser);
        let url = client.authorization_url();

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
        assert!(query.contains(&("client_id".to_string(), "beacon-mobile".to_string())));
        assert!(query.contains(&("redirect_uri".to_string(), "beacon://callback".to_string())));
        assert!(query.contains(&("scope".to_string(), "openid profile api".to_string())));
    }

    #[test]
    fn test_end_session_url_includes_id_token_hint() {
        let client = OidcAuthClient::new(config(Some("https://idp.example.com/logout")), NoBrowser);

        let url = client.end_session_url(Some("ID1")).unwrap();
        assert!(url.query_pairs().any(|(name, value)| name == "id_token_hint" && value == "ID1"));

        let bare = client.end_session_url(None).unwrap();
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn test_invalid_grant_is_flagged() {
        let error = map_token_error(
            GrantKind::RefreshToken,
            br#"{"error":"invalid_grant","error_description":"refresh token revoked"}"#,
        );

        assert_eq!(
            error,
            AuthLibraryError::TokenRenewal {
                message: "invalid_grant: refresh token revoked".to_string(),
                invalid_grant: true,
            }
        );
    }

    #[test]
    fn test_other_refresh_rejections_are_recoverable() {
        let error = map_token_error(GrantKind::RefreshToken, br#"{"error":"server_error"}"#);

        assert!(matches!(
            error,
            AuthLibraryError::TokenRenewal {
                invalid_grant: false,
                ..
            }
        ));
    }

    #[test]
    fn test_code_exchange_rejection_maps_to_token_grant() {
        let error = map_token_error(GrantKind::AuthorizationCode, br#"{"error":"invalid_code"}"#);
        assert!(matches!(error, AuthLibraryError::TokenGrant { .. }));
    }

    #[test]
    fn test_unparseable_error_body_still_maps() {
        let error = map_token_error(GrantKind::RefreshToken, b"<html>bad gateway</html>");
        assert!(matches!(
            error,
            AuthLibraryError::TokenRenewal {
                invalid_grant: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_redirect_maps_to_cancelled() {
        let client = OidcAuthClient::new(config(None), NoBrowser);

        let error = client.begin_interactive_login().await.unwrap_err();
        assert_eq!(error, AuthLibraryError::RedirectCancelled);
    }

    #[tokio::test]
    async fn test_logout_without_end_session_is_unsupported() {
        let client = OidcAuthClient::new(config(None), NoBrowser);

        let error = client.begin_interactive_logout(None).await.unwrap_err();
        assert_eq!(error, AuthLibraryError::LogoutNotSupported);
    }

    #[tokio::test]
    async fn test_logout_with_end_session_succeeds() {
        let client = OidcAuthClient::new(config(Some("https://idp.example.com/logout")), NoBrowser);
        client.begin_interactive_logout(Some("ID1")).await.unwrap();
    }
}
