//! Adapter between an axum request layer and the security core.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware.rs (rate limit by peer IP + path, 429 on denial)
//!     → host handlers call SecurityService
//!     → response.rs (SecurityError → status code + body)
//! ```
//!
//! # Design Decisions
//! - The core classifies failures; this module alone picks status codes
//! - Integrity and entropy failures never leak detail to clients

pub mod middleware;
pub mod response;

pub use middleware::rate_limit_middleware;
