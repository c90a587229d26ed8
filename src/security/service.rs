//! Composition root consulted by the request-handling layer.

use std::sync::Arc;
use std::time::Instant;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::config::validation::validate_security;
use crate::config::SecurityConfig;
use crate::security::compare::constant_time_eq;
use crate::security::error::{DecryptionError, SecurityError, SecurityResult};
use crate::security::lockout::{LoginAttemptTracker, LoginStatus};
use crate::security::password::PasswordPolicy;
use crate::security::rate_limit::RateLimiter;
use crate::security::secrets::SecretManager;
use crate::security::token::TokenGenerator;

/// Security primitives behind one cloneable handle.
///
/// Cloning is cheap: stateful components are shared through `Arc`, so every
/// request context consults the same keyring and counters.
#[derive(Debug, Clone)]
pub struct SecurityService {
    config: Arc<SecurityConfig>,
    policy: PasswordPolicy,
    secrets: Arc<SecretManager>,
    limiter: Arc<RateLimiter>,
    logins: Arc<LoginAttemptTracker>,
    tokens: TokenGenerator,
}

impl SecurityService {
    /// Assemble a service around existing shared components.
    pub fn new(
        config: Arc<SecurityConfig>,
        secrets: Arc<SecretManager>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let logins = Arc::new(LoginAttemptTracker::new(
            config.max_login_attempts,
            config.lockout_duration(),
        ));
        Self {
            policy: PasswordPolicy::new(config.password_policy.clone()),
            config,
            secrets,
            limiter,
            logins,
            tokens: TokenGenerator,
        }
    }

    /// Build every component from configuration. Fails with `InvalidConfig`
    /// if the config does not validate, or `Entropy` if the initial key cannot
    /// be generated.
    pub fn from_config(config: Arc<SecurityConfig>) -> SecurityResult<Self> {
        validate_security(&config).map_err(SecurityError::InvalidConfig)?;
        let secrets = Arc::new(SecretManager::new(&config.key_rotation)?);
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        Ok(Self::new(config, secrets, limiter))
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn secret_manager(&self) -> &SecretManager {
        &self.secrets
    }

    pub fn validate_password(&self, password: &str) -> SecurityResult<()> {
        self.policy.evaluate(password).map_err(SecurityError::from)
    }

    pub fn check_rate_limit(&self, identity: &str, path: &str) -> bool {
        self.limiter.admit(identity, path)
    }

    /// Like [`SecurityService::check_rate_limit`], with denial as an error.
    pub fn enforce_rate_limit(&self, identity: &str, path: &str) -> SecurityResult<()> {
        if self.check_rate_limit(identity, path) {
            Ok(())
        } else {
            Err(SecurityError::RateLimitExceeded {
                identity: identity.to_string(),
                path: path.to_string(),
                retry_after: self.limiter.window(),
            })
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> SecurityResult<Vec<u8>> {
        self.secrets.encrypt(plaintext)
    }

    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        self.secrets.decrypt(envelope)
    }

    /// Encrypt a text field into a base64url envelope suitable for storage.
    pub fn encrypt_field(&self, plaintext: &str) -> SecurityResult<String> {
        let envelope = self.encrypt(plaintext.as_bytes())?;
        Ok(URL_SAFE_NO_PAD.encode(envelope))
    }

    /// Reverse of [`SecurityService::encrypt_field`].
    pub fn decrypt_field(&self, encoded: &str) -> SecurityResult<String> {
        let envelope = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| DecryptionError::CorruptCiphertext)?;
        let plaintext = self.decrypt(&envelope)?;
        String::from_utf8(plaintext)
            .map_err(|_| SecurityError::Decryption(DecryptionError::CorruptCiphertext))
    }

    /// Force a key rotation. Returns the new key version.
    pub fn rotate_keys(&self) -> SecurityResult<u32> {
        self.secrets.rotate()
    }

    pub fn generate_token(&self, byte_length: usize) -> SecurityResult<String> {
        self.tokens.generate(byte_length)
    }

    pub fn secure_compare(&self, a: &[u8], b: &[u8]) -> bool {
        constant_time_eq(a, b)
    }

    /// Fails with `AccountLocked` while the account is locked out.
    pub fn check_login(&self, account: &str) -> SecurityResult<()> {
        self.logins.check(account)
    }

    pub fn record_login_failure(&self, account: &str) -> LoginStatus {
        self.logins.record_failure(account)
    }

    pub fn record_login_success(&self, account: &str) {
        self.logins.record_success(account)
    }

    /// Evict expired rate-limit buckets and lockouts. Admission already
    /// sweeps lazily; hosts may also call this from a timer.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.limiter.sweep(now);
        self.logins.sweep(now);
    }
}
