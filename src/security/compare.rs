//! Timing-safe secret comparison.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare two secrets without leaking where they differ or whether their
/// lengths differ. Both inputs are hashed to fixed-size digests first.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let left = Sha256::digest(a);
    let right = Sha256::digest(b);
    left.as_slice().ct_eq(right.as_slice()).into()
}
