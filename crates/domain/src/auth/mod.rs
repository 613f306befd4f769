//! Authentication state and token material.
//!
//! This module provides:
//! - The atomically-replaced [`AuthState`] snapshot of a user's tokens
//! - The [`TokenGrant`] material returned by the authentication library

mod grant;
mod state;

pub use grant::TokenGrant;
pub use state::AuthState;
