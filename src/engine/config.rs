//! Engine tunables.

use chrono::Duration;

const DEFAULT_MAX_FAILED_ATTEMPTS: i32 = 5;
const DEFAULT_LOCK_SECONDS: i64 = 5 * 60;
const DEFAULT_COOLDOWN_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_TICKET_TTL_SECONDS: i64 = 10 * 60;

/// Thresholds and windows for lockout, recovery cooldown, and reset tickets.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    max_failed_attempts: i32,
    lock_seconds: i64,
    cooldown_seconds: i64,
    ticket_ttl_seconds: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Defaults: five failures lock for five minutes, resets cool down for
    /// 24 hours, tickets live ten minutes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_seconds: DEFAULT_LOCK_SECONDS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            ticket_ttl_seconds: DEFAULT_TICKET_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_max_failed_attempts(mut self, attempts: i32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_lock_seconds(mut self, seconds: i64) -> Self {
        self.lock_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_ticket_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ticket_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn max_failed_attempts(&self) -> i32 {
        self.max_failed_attempts
    }

    #[must_use]
    pub fn lock_duration(&self) -> Duration {
        Duration::seconds(self.lock_seconds)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.cooldown_seconds)
    }

    #[must_use]
    pub fn ticket_ttl(&self) -> Duration {
        Duration::seconds(self.ticket_ttl_seconds)
    }
}
