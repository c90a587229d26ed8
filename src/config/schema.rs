//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Security core settings.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Security configuration shared by every component of the core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Key rotation settings.
    pub key_rotation: KeyRotationConfig,

    /// Password policy settings.
    pub password_policy: PasswordPolicyConfig,

    /// Rate limiting settings.
    pub rate_limit: RateLimitConfig,

    /// Failed logins tolerated before an account is locked.
    pub max_login_attempts: u32,

    /// Account lockout duration in seconds.
    pub lockout_secs: u64,
}

impl SecurityConfig {
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            key_rotation: KeyRotationConfig::default(),
            password_policy: PasswordPolicyConfig::default(),
            rate_limit: RateLimitConfig::default(),
            max_login_attempts: 5,
            lockout_secs: 15 * 60,
        }
    }
}

/// Key rotation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyRotationConfig {
    /// Enable time-based rotation.
    pub enabled: bool,

    /// Maximum key age in seconds before the next encrypt rotates it.
    pub interval_secs: u64,

    /// Encryption algorithm. Only "AES-256-GCM" is supported.
    pub algorithm: String,

    /// Key length in bits.
    pub key_length: u32,

    /// Number of key versions kept for decryption, current included.
    pub retained_keys: usize,
}

impl KeyRotationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30 * 24 * 60 * 60, // 30 days
            algorithm: "AES-256-GCM".to_string(),
            key_length: 256,
            retained_keys: 4,
        }
    }
}

/// Password policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    /// Minimum password length in characters.
    pub min_length: usize,

    /// Require at least one digit.
    pub require_numbers: bool,

    /// Require at least one non-alphanumeric character.
    pub require_symbols: bool,

    /// Require at least one uppercase letter.
    pub require_uppercase: bool,

    /// Require at least one lowercase letter.
    pub require_lowercase: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 12,
            require_numbers: true,
            require_symbols: true,
            require_uppercase: true,
            require_lowercase: true,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Maximum admitted requests per identity and path within one window.
    pub max_requests: u32,

    /// Paths that are never limited.
    pub exempt_paths: Vec<String>,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 100,
            exempt_paths: vec!["/health".to_string(), "/metrics".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
