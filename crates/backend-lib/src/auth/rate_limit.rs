// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for interactive authentication attempts.

use dashmap::DashMap;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics as metric_keys;

/// Default number of failed attempts before lockout
const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT: Duration = Duration::from_secs(5 * 60);

/// How long an idle failure record is kept around
const RECORD_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct AttemptRecord {
    failures: u32,
    last_failure: Instant,
    locked_until: Option<Instant>,
}

/// Tracks failed interactive logins per account name and locks the name
/// out after too many consecutive failures.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, AttemptRecord>>,
    max_failures: u32,
    lockout: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES, DEFAULT_LOCKOUT)
    }
}

impl AuthRateLimiter {
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_failures,
            lockout,
        }
    }

    /// Whether an attempt for this account name may proceed
    pub fn check(&self, key: &str) -> bool {
        match self.attempts.get(key) {
            Some(record) => match record.locked_until {
                Some(until) => Instant::now() >= until,
                None => true,
            },
            None => true,
        }
    }

    /// Record a failed attempt, locking the name out once the threshold
    /// is crossed
    pub fn record_failure(&self, key: &str) {
        let now = Instant::now();
        let mut record = self.attempts.entry(key.to_string()).or_insert(AttemptRecord {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });

        // a lapsed lockout starts a fresh count
        if matches!(record.locked_until, Some(until) if now >= until) {
            record.failures = 0;
            record.locked_until = None;
        }

        record.failures += 1;
        record.last_failure = now;

        if record.failures >= self.max_failures {
            record.locked_until = Some(now + self.lockout);
            tracing::warn!(account = key, "account locked out after repeated auth failures");
            counter!(metric_keys::AUTH_LOCKOUT).increment(1);
        }
    }

    /// A successful attempt clears the failure history
    pub fn record_success(&self, key: &str) {
        self.attempts.remove(key);
    }

    /// Drop lapsed lockouts and stale failure records
    pub fn sweep(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, record| {
            if let Some(until) = record.locked_until {
                return now < until;
            }
            now.duration_since(record.last_failure) < RECORD_RETENTION
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_until_threshold() {
        let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));

        limiter.record_failure("ada");
        limiter.record_failure("ada");
        assert!(limiter.check("ada"));

        limiter.record_failure("ada");
        assert!(!limiter.check("ada"));

        // other accounts are unaffected
        assert!(limiter.check("grace"));
    }

    #[test]
    fn test_success_clears_history() {
        let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));

        limiter.record_failure("ada");
        limiter.record_failure("ada");
        limiter.record_success("ada");

        limiter.record_failure("ada");
        limiter.record_failure("ada");
        assert!(limiter.check("ada"));
    }

    #[test]
    fn test_lockout_expires() {
        let limiter = AuthRateLimiter::new(1, Duration::ZERO);

        limiter.record_failure("ada");
        // zero-duration lockout lapses immediately
        assert!(limiter.check("ada"));

        // the next failure after a lapsed lockout restarts the count
        limiter.record_failure("ada");
        limiter.sweep();
        assert!(limiter.check("ada"));
    }
}
