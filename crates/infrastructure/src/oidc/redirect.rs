//! Interactive redirect boundary.

use std::future::Future;

use thiserror::Error;
use url::Url;

/// Failures of the interactive redirect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectError {
    /// The user dismissed the browser interaction.
    #[error("redirect cancelled by the user")]
    Cancelled,

    /// The redirect could not be carried out.
    #[error("redirect failed: {0}")]
    Failed(String),
}

/// Port for the user-facing redirect interaction.
///
/// The platform shell (a system browser tab, an embedded web view)
/// implements this; the OIDC client only builds the URLs and consumes
/// the returned authorization code.
pub trait RedirectFlow: Send + Sync {
    /// Sends the user to `authorize_url` and returns the authorization
    /// code delivered to the redirect URI.
    fn authorize(
        &self,
        authorize_url: Url,
    ) -> impl Future<Output = Result<String, RedirectError>> + Send;

    /// Sends the user to the provider's end-session page.
    fn end_session(
        &self,
        end_session_url: Url,
    ) -> impl Future<Output = Result<(), RedirectError>> + Send;
}
