//! Security error taxonomy.
//!
//! The core only classifies failures; status mapping lives in `crate::http`.

use std::time::Duration;

use thiserror::Error;

use crate::config::validation::{join_errors, ValidationError};

/// The first password rule a candidate failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("password must be at least {min_length} characters")]
    TooShort { min_length: usize },

    #[error("password must contain at least one number")]
    MissingDigit,

    #[error("password must contain at least one symbol")]
    MissingSymbol,

    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
}

/// Why a ciphertext envelope could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// The key version is not (or no longer) in the keyring.
    #[error("key version {version} is not in the keyring")]
    KeyNotFound { version: u32 },

    /// Truncated envelope or failed authentication.
    #[error("ciphertext is corrupt or was tampered with")]
    CorruptCiphertext,
}

/// Errors surfaced by the security core.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("password policy violation: {0}")]
    Policy(#[from] PolicyViolation),

    #[error("rate limit exceeded for {identity} on {path}")]
    RateLimitExceeded {
        identity: String,
        path: String,
        retry_after: Duration,
    },

    #[error("account locked, retry after {}s", .retry_after.as_secs())]
    AccountLocked { retry_after: Duration },

    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The OS random source failed. Callers must not fall back to a weaker one.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("token length must be at least 1 byte, got {0}")]
    InvalidTokenLength(usize),

    #[error("invalid security configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),
}

impl SecurityError {
    /// True when the process can no longer safely issue secrets or keys.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SecurityError::Entropy(_))
    }
}

impl From<rand::Error> for SecurityError {
    fn from(err: rand::Error) -> Self {
        SecurityError::Entropy(err.to_string())
    }
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
