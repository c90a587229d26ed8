//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming privileged request (external request layer):
//!     → rate_limit.rs (per identity + path window)
//!     → service.rs, as the handler needs:
//!         password.rs   (credential strength)
//!         lockout.rs    (failed login tracking)
//!         secrets.rs    (encrypt / decrypt sensitive fields)
//!         token.rs      (mint tokens)
//!         compare.rs    (compare presented secrets)
//! ```
//!
//! # Design Decisions
//! - Fail closed: no best-effort plaintext, no weaker entropy fallback
//! - Shared state is lock-sharded or snapshot-swapped, never one global lock
//! - Components never depend on the graph or AI subsystems

pub mod compare;
pub mod error;
pub mod lockout;
pub mod password;
pub mod rate_limit;
pub mod secrets;
pub mod service;
pub mod token;

pub use error::{DecryptionError, PolicyViolation, SecurityError, SecurityResult};
pub use lockout::LoginStatus;
pub use service::SecurityService;
