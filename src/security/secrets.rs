//! Symmetric key lifecycle: versioned keyring, lazy rotation, AEAD.
//!
//! # Envelope format
//! ```text
//! ┌──────────────┬──────────────┬───────────────────────────┐
//! │ version (4B) │  nonce (12B) │ AES-256-GCM ct + tag (16B) │
//! │  big-endian  │    random    │  AAD = version bytes       │
//! └──────────────┴──────────────┴───────────────────────────┘
//! ```
//!
//! # Design Decisions
//! - Readers load an immutable `Keyring` snapshot through `ArcSwap`
//! - Rotation is serialized by a mutex and published with one atomic store
//! - Rotation is checked on encrypt only; decrypt never rotates
//! - Old versions stay in the keyring until `retained_keys` newer ones exist

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use arc_swap::ArcSwap;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::config::KeyRotationConfig;
use crate::observability::metrics;
use crate::security::error::{DecryptionError, SecurityError, SecurityResult};

const KEY_LEN: usize = 32;
const VERSION_LEN: usize = 4;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// One generation of key material. Immutable once created.
struct KeyMaterial {
    version: u32,
    created_at: Instant,
    cipher: Aes256Gcm,
}

impl KeyMaterial {
    fn generate(version: u32, created_at: Instant) -> SecurityResult<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.try_fill_bytes(&mut bytes[..])?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&bytes[..]));
        Ok(Self {
            version,
            created_at,
            cipher,
        })
    }

    fn seal(&self, plaintext: &[u8]) -> SecurityResult<Vec<u8>> {
        let header = self.version.to_be_bytes();
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce_bytes)?;

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|e| SecurityError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(VERSION_LEN + NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&header);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }

    fn open(&self, header: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| DecryptionError::CorruptCiphertext)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("version", &self.version)
            .field("created_at", &self.created_at)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Snapshot of the key state. `retained` always contains `current`.
#[derive(Debug)]
struct Keyring {
    current: Arc<KeyMaterial>,
    retained: BTreeMap<u32, Arc<KeyMaterial>>,
}

/// Owns the keyring and performs encryption and decryption.
#[derive(Debug)]
pub struct SecretManager {
    keyring: ArcSwap<Keyring>,
    rotation_lock: Mutex<()>,
    rotation_enabled: bool,
    rotation_interval: Duration,
    retained_keys: usize,
}

impl SecretManager {
    /// Create a manager with a freshly generated version 1 key.
    pub fn new(config: &KeyRotationConfig) -> SecurityResult<Self> {
        Self::new_at(config, Instant::now())
    }

    fn new_at(config: &KeyRotationConfig, now: Instant) -> SecurityResult<Self> {
        let first = Arc::new(KeyMaterial::generate(1, now)?);
        let mut retained = BTreeMap::new();
        retained.insert(first.version, first.clone());

        tracing::info!(
            version = first.version,
            rotation_enabled = config.enabled,
            interval_secs = config.interval_secs,
            retained_keys = config.retained_keys,
            "Secret manager initialized"
        );
        metrics::record_key_version(first.version);

        Ok(Self {
            keyring: ArcSwap::from_pointee(Keyring {
                current: first,
                retained,
            }),
            rotation_lock: Mutex::new(()),
            rotation_enabled: config.enabled,
            rotation_interval: config.interval(),
            retained_keys: config.retained_keys.max(1),
        })
    }

    /// Encrypt under the current key, rotating first if it is stale.
    pub fn encrypt(&self, plaintext: &[u8]) -> SecurityResult<Vec<u8>> {
        self.encrypt_at(plaintext, Instant::now())
    }

    pub(crate) fn encrypt_at(&self, plaintext: &[u8], now: Instant) -> SecurityResult<Vec<u8>> {
        let key = self.current_key(now)?;
        key.seal(plaintext)
    }

    /// Decrypt an envelope produced by [`SecretManager::encrypt`].
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        if envelope.len() < VERSION_LEN + NONCE_LEN + TAG_LEN {
            metrics::record_decrypt_failure("truncated");
            return Err(DecryptionError::CorruptCiphertext);
        }
        let (header, rest) = envelope.split_at(VERSION_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let mut version_bytes = [0u8; VERSION_LEN];
        version_bytes.copy_from_slice(header);
        let version = u32::from_be_bytes(version_bytes);

        let key = match self.keyring.load().retained.get(&version) {
            Some(key) => key.clone(),
            None => {
                tracing::warn!(version, "Ciphertext key version not in keyring");
                metrics::record_decrypt_failure("key_not_found");
                return Err(DecryptionError::KeyNotFound { version });
            }
        };

        key.open(header, nonce, ciphertext).inspect_err(|_| {
            tracing::warn!(version, "Ciphertext failed authentication");
            metrics::record_decrypt_failure("corrupt");
        })
    }

    /// Force a rotation regardless of key age. Returns the new version.
    pub fn rotate(&self) -> SecurityResult<u32> {
        let _guard = self.rotation_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let ring = self.keyring.load_full();
        self.install_next(&ring, Instant::now()).map(|key| key.version)
    }

    /// Version of the key new ciphertext is produced under.
    pub fn current_version(&self) -> u32 {
        self.keyring.load().current.version
    }

    /// Versions still eligible for decryption, oldest first.
    pub fn retained_versions(&self) -> Vec<u32> {
        self.keyring.load().retained.keys().copied().collect()
    }

    fn is_stale(&self, key: &KeyMaterial, now: Instant) -> bool {
        self.rotation_enabled && now.saturating_duration_since(key.created_at) > self.rotation_interval
    }

    fn current_key(&self, now: Instant) -> SecurityResult<Arc<KeyMaterial>> {
        let current = self.keyring.load().current.clone();
        if !self.is_stale(&current, now) {
            return Ok(current);
        }

        let _guard = self.rotation_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have rotated while we waited.
        let ring = self.keyring.load_full();
        if !self.is_stale(&ring.current, now) {
            return Ok(ring.current.clone());
        }
        self.install_next(&ring, now)
    }

    /// Caller must hold `rotation_lock`.
    fn install_next(&self, ring: &Keyring, now: Instant) -> SecurityResult<Arc<KeyMaterial>> {
        let version = ring
            .current
            .version
            .checked_add(1)
            .ok_or_else(|| SecurityError::Encryption("key version space exhausted".into()))?;
        let next = Arc::new(KeyMaterial::generate(version, now)?);

        let mut retained = ring.retained.clone();
        retained.insert(version, next.clone());
        let mut evicted = Vec::new();
        while retained.len() > self.retained_keys {
            if let Some((old, _)) = retained.pop_first() {
                evicted.push(old);
            }
        }

        self.keyring.store(Arc::new(Keyring {
            current: next.clone(),
            retained,
        }));

        tracing::info!(
            version,
            previous = ring.current.version,
            evicted = ?evicted,
            "Encryption key rotated"
        );
        metrics::record_key_rotation(version);

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn config(retained_keys: usize) -> KeyRotationConfig {
        KeyRotationConfig {
            interval_secs: 60,
            retained_keys,
            ..KeyRotationConfig::default()
        }
    }

    #[test]
    fn test_roundtrip() {
        let manager = SecretManager::new(&config(4)).unwrap();
        for plaintext in [&b""[..], b"x", b"sensitive node payload"] {
            let envelope = manager.encrypt(plaintext).unwrap();
            assert_eq!(manager.decrypt(&envelope).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_envelope_is_tagged_with_version() {
        let manager = SecretManager::new(&config(4)).unwrap();
        let envelope = manager.encrypt(b"data").unwrap();
        assert_eq!(&envelope[..VERSION_LEN], &1u32.to_be_bytes());
        assert_eq!(envelope.len(), VERSION_LEN + NONCE_LEN + 4 + TAG_LEN);
    }

    #[test]
    fn test_no_rotation_within_interval() {
        let start = Instant::now();
        let manager = SecretManager::new_at(&config(4), start).unwrap();

        manager.encrypt_at(b"a", start + Duration::from_secs(60)).unwrap();
        assert_eq!(manager.current_version(), 1);
    }

    #[test]
    fn test_lazy_rotation_keeps_old_ciphertext_readable() {
        let start = Instant::now();
        let manager = SecretManager::new_at(&config(4), start).unwrap();

        let old = manager.encrypt_at(b"before", start).unwrap();
        let new = manager.encrypt_at(b"after", start + Duration::from_secs(61)).unwrap();

        assert_eq!(manager.current_version(), 2);
        assert_eq!(&new[..VERSION_LEN], &2u32.to_be_bytes());
        assert_eq!(manager.decrypt(&old).unwrap(), b"before");
        assert_eq!(manager.decrypt(&new).unwrap(), b"after");
    }

    #[test]
    fn test_evicted_version_is_key_not_found() {
        let manager = SecretManager::new(&config(2)).unwrap();
        let envelope = manager.encrypt(b"old").unwrap();

        manager.rotate().unwrap();
        assert_eq!(manager.decrypt(&envelope).unwrap(), b"old");

        manager.rotate().unwrap();
        assert_eq!(manager.retained_versions(), vec![2, 3]);
        assert_eq!(
            manager.decrypt(&envelope),
            Err(DecryptionError::KeyNotFound { version: 1 })
        );
    }

    #[test]
    fn test_rotation_disabled() {
        let start = Instant::now();
        let cfg = KeyRotationConfig {
            enabled: false,
            ..config(4)
        };
        let manager = SecretManager::new_at(&cfg, start).unwrap();
        manager.encrypt_at(b"a", start + Duration::from_secs(3600)).unwrap();
        assert_eq!(manager.current_version(), 1);
    }

    #[test]
    fn test_tampering_is_detected() {
        let manager = SecretManager::new(&config(4)).unwrap();
        let mut envelope = manager.encrypt(b"payload").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0x01;
        assert_eq!(manager.decrypt(&envelope), Err(DecryptionError::CorruptCiphertext));
    }

    #[test]
    fn test_truncated_envelope() {
        let manager = SecretManager::new(&config(4)).unwrap();
        assert_eq!(manager.decrypt(&[]), Err(DecryptionError::CorruptCiphertext));
        assert_eq!(
            manager.decrypt(&[0, 0, 0, 1, 2, 3]),
            Err(DecryptionError::CorruptCiphertext)
        );
    }

    #[test]
    fn test_retagged_version_fails_authentication() {
        let manager = SecretManager::new(&config(4)).unwrap();
        let mut envelope = manager.encrypt(b"payload").unwrap();
        manager.rotate().unwrap();

        envelope[..VERSION_LEN].copy_from_slice(&2u32.to_be_bytes());
        assert_eq!(manager.decrypt(&envelope), Err(DecryptionError::CorruptCiphertext));
    }

    #[test]
    fn test_unknown_version() {
        let manager = SecretManager::new(&config(4)).unwrap();
        let mut envelope = manager.encrypt(b"payload").unwrap();
        envelope[..VERSION_LEN].copy_from_slice(&99u32.to_be_bytes());
        assert_eq!(
            manager.decrypt(&envelope),
            Err(DecryptionError::KeyNotFound { version: 99 })
        );
    }

    #[test]
    fn test_concurrent_encrypts_rotate_once() {
        let start = Instant::now();
        let manager = Arc::new(SecretManager::new_at(&config(4), start).unwrap());
        let later = start + Duration::from_secs(120);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || {
                    (0..50)
                        .map(|_| manager.encrypt_at(b"concurrent", later).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for envelope in handle.join().unwrap() {
                assert_eq!(&envelope[..VERSION_LEN], &2u32.to_be_bytes());
                assert_eq!(manager.decrypt(&envelope).unwrap(), b"concurrent");
            }
        }
        assert_eq!(manager.current_version(), 2);
    }

    #[test]
    fn test_debug_is_redacted() {
        let manager = SecretManager::new(&config(4)).unwrap();
        let rendered = format!("{:?}", manager);
        assert!(rendered.contains("[REDACTED]"));
    }
}
