//! Environment-based configuration.
//!
//! The demo binary reads everything it needs from `BEACON_*` variables;
//! a host application would assemble the same structs from its own
//! settings system.

use beacon_infrastructure::OidcConfig;
use url::Url;

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the protected API.
    pub api_base_url: String,
    /// Client identifier sent as a diagnostic header.
    pub client_id: String,
    /// User agent for outgoing HTTP requests.
    pub user_agent: String,
    /// Provider endpoints and OAuth client settings.
    pub oidc: OidcConfig,
}

/// A missing or malformed environment variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The variable is not set.
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    /// The variable is set but does not parse as a URL.
    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        source: url::ParseError,
    },
}

impl AppConfig {
    /// Assembles the configuration from `BEACON_*` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or malformed
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = required("BEACON_CLIENT_ID")?;

        Ok(Self {
            api_base_url: required("BEACON_API_BASE_URL")?,
            user_agent: format!("beacon/{}", env!("CARGO_PKG_VERSION")),
            oidc: OidcConfig {
                authorize_url: required_url("BEACON_AUTHORIZE_URL")?,
                token_url: required_url("BEACON_TOKEN_URL")?,
                end_session_url: optional_url("BEACON_END_SESSION_URL")?,
                client_id: client_id.clone(),
                client_secret: std::env::var("BEACON_CLIENT_SECRET").ok(),
                redirect_uri: required("BEACON_REDIRECT_URI")?,
                scope: std::env::var("BEACON_SCOPE")
                    .unwrap_or_else(|_| "openid profile offline_access".to_string()),
            },
            client_id,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn required_url(name: &'static str) -> Result<Url, ConfigError> {
    Url::parse(&required(name)?).map_err(|source| ConfigError::InvalidUrl { name, source })
}

fn optional_url(name: &'static str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|source| ConfigError::InvalidUrl { name, source }),
        Err(_) => Ok(None),
    }
}
