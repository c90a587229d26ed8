//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! security components produce:
//!     → tracing events (rotation, denials, lockouts, decrypt failures)
//!     → metrics.rs (counters, gauges)
//!
//! The binary installs the subscriber from logging.rs; a host request
//! layer installs its own subscriber and metrics recorder.
//! ```

pub mod logging;
pub mod metrics;
