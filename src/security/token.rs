//! Secure random tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::security::error::{SecurityError, SecurityResult};

/// Default token size in bytes of entropy.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Produces URL-safe tokens from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    /// Generate a token carrying `byte_length` random bytes, base64url-encoded
    /// without padding.
    pub fn generate(&self, byte_length: usize) -> SecurityResult<String> {
        if byte_length == 0 {
            return Err(SecurityError::InvalidTokenLength(byte_length));
        }
        let mut bytes = vec![0u8; byte_length];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }
}
