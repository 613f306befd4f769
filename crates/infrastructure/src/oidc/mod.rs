//! OIDC authentication adapter.
//!
//! This module provides:
//! - The token-endpoint client implementing the `AuthLibrary` port
//! - The redirect-flow boundary behind which the interactive browser
//!   interaction lives

mod client;
mod redirect;

pub use client::{OidcAuthClient, OidcConfig};
pub use redirect::{RedirectError, RedirectFlow};
