//! Brute-force lockout policy.
//!
//! Pure decisions over an account's attempt counters. The caller reads the
//! counters, asks [`active_lock`] whether to refuse outright, runs the
//! password check only when allowed, and then applies the [`LockDecision`]
//! from [`after_attempt`] through a guarded store write. Clock input is
//! always explicit.

use chrono::{DateTime, Duration, Utc};

/// Attempt-counter fields of an account, as read before a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptState {
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Next auth state after an allowed password check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockDecision {
    /// Correct password: clear counters, stamp the login time.
    Grant,
    /// Wrong password below the threshold: bump the counter.
    Count { failed_attempts: i32 },
    /// Wrong password at the threshold: lock and reset the counter.
    Lock { until: DateTime<Utc> },
}

/// Lock timestamp still in the future, if any.
///
/// While this returns `Some`, no password check may run and nothing is
/// written; an elapsed lock reads as unlocked.
#[must_use]
pub fn active_lock(state: &AttemptState, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    state.locked_until.filter(|until| *until > now)
}

/// Decide the counter transition after a password check.
///
/// Only valid when [`active_lock`] returned `None`; a lock that has elapsed
/// is cleared by whichever decision gets applied.
#[must_use]
pub fn after_attempt(
    state: &AttemptState,
    verified: bool,
    now: DateTime<Utc>,
    max_failed_attempts: i32,
    lock_duration: Duration,
) -> LockDecision {
    if verified {
        return LockDecision::Grant;
    }

    let failed_attempts = state.failed_attempts.saturating_add(1);
    if failed_attempts >= max_failed_attempts {
        LockDecision::Lock {
            until: now + lock_duration,
        }
    } else {
        LockDecision::Count { failed_attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: i32 = 5;

    fn lock_window() -> Duration {
        Duration::minutes(5)
    }

    fn unlocked(failed_attempts: i32) -> AttemptState {
        AttemptState {
            failed_attempts,
            locked_until: None,
        }
    }

    #[test]
    fn future_lock_is_active() {
        let now = Utc::now();
        let state = AttemptState {
            failed_attempts: 0,
            locked_until: Some(now + Duration::seconds(30)),
        };
        assert_eq!(active_lock(&state, now), Some(now + Duration::seconds(30)));
    }

    #[test]
    fn elapsed_lock_is_inactive() {
        let now = Utc::now();
        let state = AttemptState {
            failed_attempts: 0,
            locked_until: Some(now - Duration::seconds(1)),
        };
        assert_eq!(active_lock(&state, now), None);
        assert_eq!(active_lock(&unlocked(3), now), None);
    }

    #[test]
    fn correct_password_grants() {
        let now = Utc::now();
        assert_eq!(
            after_attempt(&unlocked(4), true, now, MAX, lock_window()),
            LockDecision::Grant
        );
    }

    #[test]
    fn failures_below_threshold_count_up() {
        let now = Utc::now();
        assert_eq!(
            after_attempt(&unlocked(0), false, now, MAX, lock_window()),
            LockDecision::Count { failed_attempts: 1 }
        );
        assert_eq!(
            after_attempt(&unlocked(3), false, now, MAX, lock_window()),
            LockDecision::Count { failed_attempts: 4 }
        );
    }

    #[test]
    fn fifth_failure_locks_for_the_window() {
        let now = Utc::now();
        assert_eq!(
            after_attempt(&unlocked(4), false, now, MAX, lock_window()),
            LockDecision::Lock {
                until: now + Duration::minutes(5)
            }
        );
    }

    #[test]
    fn counting_restarts_after_a_lock_elapses() {
        let now = Utc::now();
        // Locks reset the counter to zero, so the first failure after expiry
        // counts as one, not six.
        let state = AttemptState {
            failed_attempts: 0,
            locked_until: Some(now - Duration::minutes(1)),
        };
        assert_eq!(
            after_attempt(&state, false, now, MAX, lock_window()),
            LockDecision::Count { failed_attempts: 1 }
        );
    }
}
