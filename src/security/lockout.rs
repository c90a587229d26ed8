//! Failed-login tracking and temporary account lockout.
//!
//! Independent from rate limiting: denied rate-limit attempts never count
//! here, and lockouts never consume rate-limit quota.
//!
//! # Design Decisions
//! - Failures are counted in a window of `lockout` length that opens at the
//!   first failure; a window that lapses without a lock starts over
//! - Entries with neither live failures nor an active lock are swept at most
//!   once per `lockout` by whichever `record_failure` wins the CAS

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::security::error::{SecurityError, SecurityResult};

/// Outcome of recording a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    /// Further attempts are allowed.
    Allowed { remaining: u32 },
    /// The account is locked.
    Locked { retry_after: Duration },
}

#[derive(Debug, Default)]
struct LoginAttemptState {
    failures: u32,
    first_failure: Option<Instant>,
    locked_until: Option<Instant>,
}

impl LoginAttemptState {
    /// Clears an expired lock. Returns the remaining lock time if still locked.
    fn lock_remaining(&mut self, now: Instant) -> Option<Duration> {
        match self.locked_until {
            Some(until) if until > now => Some(until - now),
            Some(_) => {
                self.locked_until = None;
                None
            }
            None => None,
        }
    }

    /// Forgets failures whose counting window has lapsed.
    fn expire_failures(&mut self, now: Instant, window: Duration) {
        if let Some(first) = self.first_failure {
            if now.saturating_duration_since(first) >= window {
                self.failures = 0;
                self.first_failure = None;
            }
        }
    }

    fn is_idle(&mut self, now: Instant, window: Duration) -> bool {
        self.expire_failures(now, window);
        self.lock_remaining(now).is_none() && self.failures == 0
    }
}

/// Tracks failed login attempts per account.
#[derive(Debug)]
pub struct LoginAttemptTracker {
    attempts: DashMap<String, LoginAttemptState>,
    max_attempts: u32,
    /// Lock duration, also the failure counting window.
    lockout: Duration,
    /// Reference point for `last_sweep_ms`.
    epoch: Instant,
    last_sweep_ms: AtomicU64,
}

impl LoginAttemptTracker {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self::with_epoch(max_attempts, lockout, Instant::now())
    }

    fn with_epoch(max_attempts: u32, lockout: Duration, epoch: Instant) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts: max_attempts.max(1),
            lockout,
            epoch,
            last_sweep_ms: AtomicU64::new(0),
        }
    }

    /// Fails with `AccountLocked` while the account is locked.
    pub fn check(&self, account: &str) -> SecurityResult<()> {
        self.check_at(account, Instant::now())
    }

    pub(crate) fn check_at(&self, account: &str, now: Instant) -> SecurityResult<()> {
        let Some(mut state) = self.attempts.get_mut(account) else {
            return Ok(());
        };
        match state.lock_remaining(now) {
            Some(retry_after) => Err(SecurityError::AccountLocked { retry_after }),
            None => Ok(()),
        }
    }

    pub fn record_failure(&self, account: &str) -> LoginStatus {
        self.record_failure_at(account, Instant::now())
    }

    pub(crate) fn record_failure_at(&self, account: &str, now: Instant) -> LoginStatus {
        // Before taking the entry guard: `retain` locks every shard.
        self.maybe_sweep(now);

        let mut state = self.attempts.entry(account.to_string()).or_default();

        if let Some(retry_after) = state.lock_remaining(now) {
            return LoginStatus::Locked { retry_after };
        }

        state.expire_failures(now, self.lockout);
        if state.failures == 0 {
            state.first_failure = Some(now);
        }
        state.failures += 1;

        if state.failures >= self.max_attempts {
            state.failures = 0;
            state.first_failure = None;
            state.locked_until = Some(now + self.lockout);
            tracing::warn!(
                account = %account,
                lockout_secs = self.lockout.as_secs(),
                "Account locked after repeated login failures"
            );
            metrics::record_account_lockout();
            return LoginStatus::Locked {
                retry_after: self.lockout,
            };
        }

        LoginStatus::Allowed {
            remaining: self.max_attempts - state.failures,
        }
    }

    /// Forget all failures for an account after a successful login.
    pub fn record_success(&self, account: &str) {
        self.attempts.remove(account);
    }

    /// Number of accounts currently tracked.
    pub fn tracked_accounts(&self) -> usize {
        self.attempts.len()
    }

    /// Drop accounts with no failures in the current window and no active lock.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.attempts.len();
        self.attempts
            .retain(|_, state| !state.is_idle(now, self.lockout));
        let removed = before.saturating_sub(self.attempts.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.attempts.len(), "Swept idle login attempt entries");
        }
        removed
    }

    fn maybe_sweep(&self, now: Instant) {
        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < self.lockout.as_millis() as u64 {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.sweep(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKOUT: Duration = Duration::from_secs(900);

    #[test]
    fn test_locks_after_max_attempts() {
        let tracker = LoginAttemptTracker::new(3, LOCKOUT);
        let now = Instant::now();

        assert_eq!(
            tracker.record_failure_at("alice", now),
            LoginStatus::Allowed { remaining: 2 }
        );
        assert_eq!(
            tracker.record_failure_at("alice", now),
            LoginStatus::Allowed { remaining: 1 }
        );
        assert_eq!(
            tracker.record_failure_at("alice", now),
            LoginStatus::Locked { retry_after: LOCKOUT }
        );

        let err = tracker.check_at("alice", now + Duration::from_secs(100)).unwrap_err();
        match err {
            SecurityError::AccountLocked { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(800))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(tracker.check_at("bob", now).is_ok());
    }

    #[test]
    fn test_failures_while_locked_do_not_extend_lock() {
        let tracker = LoginAttemptTracker::new(1, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);

        let later = now + Duration::from_secs(600);
        assert_eq!(
            tracker.record_failure_at("alice", later),
            LoginStatus::Locked {
                retry_after: Duration::from_secs(300)
            }
        );
    }

    #[test]
    fn test_lock_expires() {
        let tracker = LoginAttemptTracker::new(1, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);

        assert!(tracker.check_at("alice", now + LOCKOUT).is_ok());
    }

    #[test]
    fn test_success_resets() {
        let tracker = LoginAttemptTracker::new(3, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);
        tracker.record_failure_at("alice", now);
        tracker.record_success("alice");

        assert_eq!(
            tracker.record_failure_at("alice", now),
            LoginStatus::Allowed { remaining: 2 }
        );
    }

    #[test]
    fn test_sweep_drops_expired_locks() {
        let tracker = LoginAttemptTracker::new(1, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);

        tracker.sweep(now);
        assert_eq!(tracker.attempts.len(), 1);
        tracker.sweep(now + LOCKOUT);
        assert_eq!(tracker.attempts.len(), 0);
    }

    #[test]
    fn test_failures_decay_after_window() {
        let tracker = LoginAttemptTracker::new(2, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);

        assert_eq!(
            tracker.record_failure_at("alice", now + LOCKOUT),
            LoginStatus::Allowed { remaining: 1 }
        );
        assert_eq!(
            tracker.record_failure_at("alice", now + Duration::from_secs(365 * 24 * 3600)),
            LoginStatus::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn test_failures_within_window_accumulate() {
        let tracker = LoginAttemptTracker::new(2, LOCKOUT);
        let now = Instant::now();
        tracker.record_failure_at("alice", now);

        assert_eq!(
            tracker.record_failure_at("alice", now + LOCKOUT - Duration::from_secs(1)),
            LoginStatus::Locked { retry_after: LOCKOUT }
        );
    }

    #[test]
    fn test_sweep_evicts_unlocked_failures() {
        let tracker = LoginAttemptTracker::new(5, LOCKOUT);
        let now = Instant::now();
        for i in 0..10_000 {
            tracker.record_failure_at(&format!("user-{i}"), now);
        }
        assert_eq!(tracker.tracked_accounts(), 10_000);

        assert_eq!(tracker.sweep(now + LOCKOUT - Duration::from_secs(1)), 0);
        assert_eq!(tracker.sweep(now + LOCKOUT), 10_000);
        assert_eq!(tracker.tracked_accounts(), 0);
    }

    #[test]
    fn test_record_failure_sweeps_lazily() {
        let start = Instant::now();
        let tracker = LoginAttemptTracker::with_epoch(5, LOCKOUT, start);
        for i in 0..100 {
            tracker.record_failure_at(&format!("user-{i}"), start);
        }

        tracker.record_failure_at("user-0", start + Duration::from_secs(60));
        assert_eq!(tracker.tracked_accounts(), 100);

        tracker.record_failure_at("fresh", start + LOCKOUT + Duration::from_secs(60));
        assert_eq!(tracker.tracked_accounts(), 1);
    }

    #[test]
    fn test_concurrent_failures_lock_exactly_once() {
        use std::sync::Arc;
        use std::thread;

        const THREADS: u32 = 16;
        let tracker = Arc::new(LoginAttemptTracker::new(THREADS, LOCKOUT));
        let now = Instant::now();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || tracker.record_failure_at("alice", now))
            })
            .collect();

        let locked = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|status| matches!(status, LoginStatus::Locked { .. }))
            .count();

        assert_eq!(locked, 1);
        assert!(tracker.check_at("alice", now).is_err());
    }
}
