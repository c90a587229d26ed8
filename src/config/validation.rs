//! Configuration validation.
//!
//! Semantic checks that serde cannot express: value ranges and supported
//! algorithms. Returns all validation errors, not just the first.

use thiserror::Error;

use crate::config::schema::{GuardConfig, SecurityConfig};

/// Algorithm identifier accepted for `key_rotation.algorithm`.
pub const SUPPORTED_ALGORITHM: &str = "AES-256-GCM";

/// Key length in bits accepted for `key_rotation.key_length`.
pub const SUPPORTED_KEY_LENGTH: u32 = 256;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: u64 },

    #[error("unsupported key algorithm {0:?}, expected \"AES-256-GCM\"")]
    UnsupportedAlgorithm(String),

    #[error("unsupported key length {0}, expected 256")]
    UnsupportedKeyLength(u32),

    #[error("exempt path {0:?} must start with '/'")]
    InvalidExemptPath(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    validate_security(&config.security)
}

/// Validate the security section on its own, for callers that build it in code.
pub fn validate_security(security: &SecurityConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut at_least = |field: &'static str, value: u64, min: u64| {
        if value < min {
            errors.push(ValidationError::BelowMinimum { field, min });
        }
    };

    at_least("rate_limit.window_secs", security.rate_limit.window_secs, 1);
    at_least(
        "rate_limit.max_requests",
        u64::from(security.rate_limit.max_requests),
        1,
    );
    at_least(
        "password_policy.min_length",
        security.password_policy.min_length as u64,
        1,
    );
    at_least("key_rotation.interval_secs", security.key_rotation.interval_secs, 1);
    at_least(
        "key_rotation.retained_keys",
        security.key_rotation.retained_keys as u64,
        1,
    );
    at_least("max_login_attempts", u64::from(security.max_login_attempts), 1);
    at_least("lockout_secs", security.lockout_secs, 1);

    if security.key_rotation.algorithm != SUPPORTED_ALGORITHM {
        errors.push(ValidationError::UnsupportedAlgorithm(
            security.key_rotation.algorithm.clone(),
        ));
    }
    if security.key_rotation.key_length != SUPPORTED_KEY_LENGTH {
        errors.push(ValidationError::UnsupportedKeyLength(
            security.key_rotation.key_length,
        ));
    }

    for path in &security.rate_limit.exempt_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidExemptPath(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render validation errors as one comma-separated line.
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
