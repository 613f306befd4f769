//! Beacon Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod oidc;
pub mod persistence;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use oidc::{OidcAuthClient, OidcConfig, RedirectError, RedirectFlow};
pub use persistence::FileStateStorage;
