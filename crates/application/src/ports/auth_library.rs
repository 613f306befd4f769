//! External authentication library port.
//!
//! The interactive login/logout redirect flow and the OAuth token
//! exchanges live behind this boundary. Implementations return either
//! fresh token material or a classified failure cause; the error
//! classifier maps causes into the caller-visible taxonomy.

use std::future::Future;
use std::pin::Pin;

use beacon_domain::TokenGrant;
use thiserror::Error;

/// Failure causes reported by the authentication library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthLibraryError {
    /// Provider discovery metadata could not be obtained.
    #[error("metadata lookup failed: {message}")]
    MetadataLookup {
        /// Cause description.
        message: String,
    },

    /// The user dismissed the interactive redirect.
    #[error("authorization redirect cancelled")]
    RedirectCancelled,

    /// The authorization request could not be sent.
    #[error("login request failed: {message}")]
    LoginRequest {
        /// Cause description.
        message: String,
    },

    /// The authorization response was missing or malformed.
    #[error("login response invalid: {message}")]
    LoginResponse {
        /// Cause description.
        message: String,
    },

    /// The code-for-token exchange was rejected.
    #[error("token grant rejected: {message}")]
    TokenGrant {
        /// Cause description.
        message: String,
    },

    /// The refresh-token exchange was rejected.
    #[error("token renewal rejected: {message}")]
    TokenRenewal {
        /// Cause description.
        message: String,
        /// True when the server reported the refresh token itself as
        /// invalid, expired or revoked. The held state is then useless
        /// and must be cleared.
        invalid_grant: bool,
    },

    /// The provider has no end-session support configured.
    #[error("logout not supported by the provider")]
    LogoutNotSupported,

    /// The end-session request failed.
    #[error("logout request failed: {message}")]
    LogoutRequest {
        /// Cause description.
        message: String,
    },

    /// The provider could not be reached at all.
    #[error("network failure: {message}")]
    Network {
        /// Cause description.
        message: String,
    },
}

/// Future returned by token-producing [`AuthLibrary`] operations.
pub type AuthFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TokenGrant, AuthLibraryError>> + Send + 'a>>;

/// Future returned by [`AuthLibrary::begin_interactive_logout`].
pub type LogoutFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuthLibraryError>> + Send + 'a>>;

/// Port for the external authentication library.
///
/// Object-safe (boxed futures) so a coordinator can also hold a
/// `dyn AuthLibrary` behind a pointer when generics are inconvenient.
pub trait AuthLibrary: Send + Sync {
    /// Exchanges an authorization code for the first set of tokens.
    fn exchange_authorization_code<'a>(&'a self, code: &'a str) -> AuthFuture<'a>;

    /// Exchanges a refresh token for a new set of tokens.
    fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> AuthFuture<'a>;

    /// Runs the interactive login flow end to end: authorization
    /// redirect, callback, code exchange.
    fn begin_interactive_login(&self) -> AuthFuture<'_>;

    /// Runs the interactive logout flow against the provider's
    /// end-session endpoint.
    fn begin_interactive_logout<'a>(&'a self, id_token: Option<&'a str>) -> LogoutFuture<'a>;
}
