//! Lockout and recovery knobs.
//!
//! Defaults here mirror `EngineConfig::new`; changing one side without the
//! other desynchronizes `--help` from the running policy.

use clap::{Arg, ArgMatches, Command};

use crate::engine::EngineConfig;

pub const ARG_MAX_FAILED_ATTEMPTS: &str = "max-failed-attempts";
pub const ARG_LOCK_SECONDS: &str = "lock-seconds";
pub const ARG_COOLDOWN_SECONDS: &str = "cooldown-seconds";
pub const ARG_TICKET_TTL_SECONDS: &str = "ticket-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAX_FAILED_ATTEMPTS)
                .long(ARG_MAX_FAILED_ATTEMPTS)
                .help("Consecutive failed logins before an account locks")
                .env("KUNCI_MAX_FAILED_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new(ARG_LOCK_SECONDS)
                .long(ARG_LOCK_SECONDS)
                .help("How long a locked account stays locked, in seconds")
                .env("KUNCI_LOCK_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_COOLDOWN_SECONDS)
                .long(ARG_COOLDOWN_SECONDS)
                .help("Minimum age of the last password change before a reset may start")
                .env("KUNCI_COOLDOWN_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TICKET_TTL_SECONDS)
                .long(ARG_TICKET_TTL_SECONDS)
                .help("Seconds a password-reset ticket stays valid between steps")
                .env("KUNCI_TICKET_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(i64)),
        )
}

/// Read the policy knobs into an engine configuration.
#[must_use]
pub fn engine_config(matches: &ArgMatches) -> EngineConfig {
    let mut config = EngineConfig::new();
    if let Some(attempts) = matches.get_one::<i32>(ARG_MAX_FAILED_ATTEMPTS).copied() {
        config = config.with_max_failed_attempts(attempts);
    }
    if let Some(seconds) = matches.get_one::<i64>(ARG_LOCK_SECONDS).copied() {
        config = config.with_lock_seconds(seconds);
    }
    if let Some(seconds) = matches.get_one::<i64>(ARG_COOLDOWN_SECONDS).copied() {
        config = config.with_cooldown_seconds(seconds);
    }
    if let Some(seconds) = matches.get_one::<i64>(ARG_TICKET_TTL_SECONDS).copied() {
        config = config.with_ticket_ttl_seconds(seconds);
    }
    config
}
