//! Login and lockout enforcement.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::{normalize_email, roles::highest_role, CredentialEngine};
use crate::account::{Account, AccountSummary, Role};
use crate::audit::AuditEvent;
use crate::error::{EngineError, StoreError};
use crate::lockout::{self, AttemptState, LockDecision};
use crate::password;
use crate::store::AuthStateUpdate;

const ACTION_LOGIN: &str = "login";

/// How many lost counter races to absorb before reporting a fault.
const MAX_STATE_RACES: usize = 3;

/// Result of an authentication attempt.
///
/// `NotFound` and `InvalidCredentials` are distinct so the audit trail can
/// tell them apart; outward-facing callers must present them identically.
#[derive(Debug)]
pub enum LoginOutcome {
    Success {
        account: AccountSummary,
        role: Option<Role>,
    },
    InvalidCredentials,
    AccountLocked {
        until: DateTime<Utc>,
    },
    NotFound,
}

impl CredentialEngine {
    /// Authenticate an account by email and password.
    ///
    /// A locked account is refused before any password comparison, so the
    /// hash never runs and the counters never move. Otherwise the attempt
    /// lands exactly one guarded counter write; when two attempts race, the
    /// loser re-reads and decides again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable, hashing fails,
    /// or the counter write stays contended past the retry bound.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, EngineError> {
        let result = self.login_attempt(email, password, now).await;
        if let Err(err) = &result {
            self.audit
                .record(AuditEvent::fault(now, None, ACTION_LOGIN, err));
        }
        result
    }

    async fn login_attempt(
        &self,
        email: &str,
        password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, EngineError> {
        let email = normalize_email(email);
        let Some(mut account) = self.store.find_account_by_email(&email).await? else {
            self.record(
                now,
                None,
                ACTION_LOGIN,
                "unknown_account",
                format!("no account for {email}"),
            );
            return Ok(LoginOutcome::NotFound);
        };

        for _ in 0..MAX_STATE_RACES {
            let state = AttemptState {
                failed_attempts: account.failed_attempts,
                locked_until: account.locked_until,
            };
            if let Some(until) = lockout::active_lock(&state, now) {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_LOGIN,
                    "locked",
                    format!("refused while locked until {until}"),
                );
                return Ok(LoginOutcome::AccountLocked { until });
            }

            let verified =
                password::verify_blocking(&self.hasher, password, &account.password_hash).await?;
            let decision = lockout::after_attempt(
                &state,
                verified,
                now,
                self.config.max_failed_attempts(),
                self.config.lock_duration(),
            );

            let update = auth_state_update(&state, decision, now);
            if self
                .store
                .update_auth_state(account.account_id, update)
                .await?
            {
                return self.conclude_login(&account, decision, now).await;
            }

            // Guard lost: another attempt moved the counters (or a reset
            // replaced the hash) between our read and write.
            account = match self.store.find_account_by_id(account.account_id).await? {
                Some(account) => account,
                None => {
                    self.record(
                        now,
                        None,
                        ACTION_LOGIN,
                        "unknown_account",
                        format!("account disappeared during login: {email}"),
                    );
                    return Ok(LoginOutcome::NotFound);
                }
            };
        }

        Err(EngineError::StoreUnavailable(StoreError::message(
            "login attempt counters stayed contended",
        )))
    }

    async fn conclude_login(
        &self,
        account: &Account,
        decision: LockDecision,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, EngineError> {
        match decision {
            LockDecision::Grant => {
                let roles = self.store.list_roles(account.account_id).await?;
                let role = highest_role(&roles);
                let role_name = role
                    .as_ref()
                    .map_or("none", |role| role.role_name.as_str());
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_LOGIN,
                    "success",
                    format!("signed in with role {role_name}"),
                );

                let mut summary = AccountSummary::from(account);
                summary.last_login = Some(now);
                Ok(LoginOutcome::Success {
                    account: summary,
                    role,
                })
            }
            LockDecision::Count { failed_attempts } => {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_LOGIN,
                    "invalid_password",
                    format!(
                        "failure {failed_attempts} of {}",
                        self.config.max_failed_attempts()
                    ),
                );
                Ok(LoginOutcome::InvalidCredentials)
            }
            LockDecision::Lock { until } => {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_LOGIN,
                    "invalid_password",
                    format!("failure threshold reached, locked until {until}"),
                );
                Ok(LoginOutcome::InvalidCredentials)
            }
        }
    }
}

fn auth_state_update(
    state: &AttemptState,
    decision: LockDecision,
    now: DateTime<Utc>,
) -> AuthStateUpdate {
    let (failed_attempts, locked_until, last_login) = match decision {
        LockDecision::Grant => (0, None, Some(now)),
        LockDecision::Count { failed_attempts } => (failed_attempts, None, None),
        LockDecision::Lock { until } => (0, Some(until), None),
    };
    AuthStateUpdate {
        expected_failed_attempts: state.failed_attempts,
        expected_locked_until: state.locked_until,
        failed_attempts,
        locked_until,
        last_login,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn login_outcome_debug_names() {
        assert_eq!(
            format!("{:?}", LoginOutcome::InvalidCredentials),
            "InvalidCredentials"
        );
        assert_eq!(format!("{:?}", LoginOutcome::NotFound), "NotFound");
    }

    #[test]
    fn grant_resets_counters_and_stamps_login() {
        let now = Utc::now();
        let state = AttemptState {
            failed_attempts: 3,
            locked_until: None,
        };
        let update = auth_state_update(&state, LockDecision::Grant, now);
        assert_eq!(update.expected_failed_attempts, 3);
        assert_eq!(update.failed_attempts, 0);
        assert_eq!(update.locked_until, None);
        assert_eq!(update.last_login, Some(now));
    }

    #[test]
    fn count_keeps_last_login_untouched() {
        let now = Utc::now();
        let state = AttemptState {
            failed_attempts: 1,
            locked_until: None,
        };
        let update =
            auth_state_update(&state, LockDecision::Count { failed_attempts: 2 }, now);
        assert_eq!(update.failed_attempts, 2);
        assert_eq!(update.last_login, None);
    }

    #[test]
    fn lock_resets_the_counter_and_clears_stale_locks() {
        let now = Utc::now();
        let stale = now - Duration::minutes(9);
        let state = AttemptState {
            failed_attempts: 4,
            locked_until: Some(stale),
        };
        let until = now + Duration::minutes(5);
        let update = auth_state_update(&state, LockDecision::Lock { until }, now);
        assert_eq!(update.expected_locked_until, Some(stale));
        assert_eq!(update.failed_attempts, 0);
        assert_eq!(update.locked_until, Some(until));
    }
}
