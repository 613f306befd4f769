//! Console redirect flow.
//!
//! A terminal stand-in for the platform browser: the authorization URL
//! is printed for the user to open, and the delivered code is pasted
//! back on stdin. A mobile shell would replace this with its own
//! redirect handling.

use beacon_infrastructure::{RedirectError, RedirectFlow};
use url::Url;

/// Drives the redirect interaction over the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRedirect;

impl ConsoleRedirect {
    /// Creates a console redirect flow.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RedirectFlow for ConsoleRedirect {
    async fn authorize(&self, authorize_url: Url) -> Result<String, RedirectError> {
        println!("open this URL in a browser and sign in:\n\n  {authorize_url}\n");
        println!("paste the authorization code from the redirect:");

        let code = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .map(|_| line.trim().to_string())
        })
        .await
        .map_err(|error| RedirectError::Failed(error.to_string()))?
        .map_err(|error| RedirectError::Failed(error.to_string()))?;

        if code.is_empty() {
            return Err(RedirectError::Cancelled);
        }
        Ok(code)
    }

    async fn end_session(&self, end_session_url: Url) -> Result<(), RedirectError> {
        println!("open this URL in a browser to finish signing out:\n\n  {end_session_url}\n");
        Ok(())
    }
}
