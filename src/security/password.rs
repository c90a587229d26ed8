//! Password policy enforcement.

use crate::config::PasswordPolicyConfig;
use crate::security::error::PolicyViolation;

/// Stateless evaluator for credential strength.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    config: PasswordPolicyConfig,
}

impl PasswordPolicy {
    pub fn new(config: PasswordPolicyConfig) -> Self {
        Self { config }
    }

    /// Evaluate a password, returning the first violated rule.
    ///
    /// Rules are checked in a fixed order: length, digit, symbol,
    /// uppercase, lowercase. Length counts characters, not bytes.
    pub fn evaluate(&self, password: &str) -> Result<(), PolicyViolation> {
        let cfg = &self.config;

        if password.chars().count() < cfg.min_length {
            return Err(PolicyViolation::TooShort {
                min_length: cfg.min_length,
            });
        }
        if cfg.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyViolation::MissingDigit);
        }
        if cfg.require_symbols && !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(PolicyViolation::MissingSymbol);
        }
        if cfg.require_uppercase && !password.chars().any(char::is_uppercase) {
            return Err(PolicyViolation::MissingUppercase);
        }
        if cfg.require_lowercase && !password.chars().any(char::is_lowercase) {
            return Err(PolicyViolation::MissingLowercase);
        }

        Ok(())
    }
}
