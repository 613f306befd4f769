//! Beacon Application - Coordination logic
//!
//! This crate holds the token-lifecycle and request-coordination core:
//! the authentication coordinator, the single-flight primitive that
//! collapses concurrent refreshes, the API request executor with its
//! retry-on-401 policy, and the error classifier. External systems are
//! reached exclusively through the ports defined here.

pub mod api;
pub mod auth;
pub mod ports;
pub mod single_flight;

pub use api::{ApiExecutor, classify};
pub use auth::{AuthCoordinator, AuthStateStore};
pub use single_flight::{SingleFlight, SingleFlightError};
