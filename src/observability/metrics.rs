//! Metrics emitted by the security core.
//!
//! # Metrics
//! - `guard_rate_limited_total` (counter): denied requests by path
//! - `guard_key_rotations_total` (counter): completed key rotations
//! - `guard_key_version` (gauge): version of the current encryption key
//! - `guard_decrypt_failures_total` (counter): failed decrypts by reason
//! - `guard_account_lockouts_total` (counter): accounts locked out
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use metrics::{counter, gauge};

pub fn record_rate_limited(path: &str) {
    counter!("guard_rate_limited_total", "path" => path.to_string()).increment(1);
}

pub fn record_key_rotation(version: u32) {
    counter!("guard_key_rotations_total").increment(1);
    record_key_version(version);
}

pub fn record_key_version(version: u32) {
    gauge!("guard_key_version").set(f64::from(version));
}

pub fn record_decrypt_failure(reason: &'static str) {
    counter!("guard_decrypt_failures_total", "reason" => reason).increment(1);
}

pub fn record_account_lockout() {
    counter!("guard_account_lockouts_total").increment(1);
}
