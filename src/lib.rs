//! Security core for the Vitalyst knowledge graph API.
//!
//! A request-handling layer consults [`SecurityService`] before serving
//! privileged operations: rate limiting, password policy, field encryption
//! under a rotating keyring, token minting and timing-safe comparison.

pub mod config;
pub mod http;
pub mod observability;
pub mod security;

pub use config::schema::{GuardConfig, SecurityConfig};
pub use security::{SecurityError, SecurityResult, SecurityService};
