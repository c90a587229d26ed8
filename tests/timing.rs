//! Statistical timing check for secure comparison.
//!
//! Compares median runtimes for inputs that differ in the first byte versus
//! the last byte. The bound is loose to tolerate scheduler noise.

use std::hint::black_box;
use std::time::{Duration, Instant};

mod common;

fn time_once(f: impl Fn() -> bool) -> Duration {
    let start = Instant::now();
    black_box(f());
    start.elapsed()
}

fn median(mut samples: Vec<Duration>) -> Duration {
    samples.sort();
    samples[samples.len() / 2]
}

#[test]
fn test_compare_time_independent_of_mismatch_position() {
    let service = common::service_with(|_| {});
    let secret = vec![0x41u8; 4096];
    let mut early = secret.clone();
    early[0] ^= 0xff;
    let mut late = secret.clone();
    late[4095] ^= 0xff;

    for _ in 0..500 {
        black_box(service.secure_compare(&secret, &early));
        black_box(service.secure_compare(&secret, &late));
    }

    let rounds = 3_000;
    let mut early_samples = Vec::with_capacity(rounds);
    let mut late_samples = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        early_samples.push(time_once(|| service.secure_compare(&secret, &early)));
        late_samples.push(time_once(|| service.secure_compare(&secret, &late)));
    }

    let early_median = median(early_samples).as_nanos().max(1) as f64;
    let late_median = median(late_samples).as_nanos().max(1) as f64;
    let ratio = early_median.max(late_median) / early_median.min(late_median);

    assert!(
        ratio < 3.0,
        "timing skew {ratio:.2} (early {early_median}ns, late {late_median}ns)"
    );
}

#[test]
fn test_compare_results() {
    let service = common::service_with(|_| {});
    assert!(service.secure_compare(b"same", b"same"));
    assert!(!service.secure_compare(b"same", b"Same"));
    assert!(!service.secure_compare(b"same", b"same-but-longer"));
}
