//! Three-step password recovery.
//!
//! Identify the account, prove the security answers, set a new password.
//! The steps are bound together by a [`ResetTicket`](crate::ticket::ResetTicket)
//! that only moves forward, so the final step cannot run without the
//! answers having been verified on the same ticket. Recovery never touches
//! the login lockout counters.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use super::{normalize_email, CredentialEngine};
use crate::account::Account;
use crate::audit::AuditEvent;
use crate::error::{EngineError, StoreError};
use crate::password;
use crate::ticket::TicketStage;

const ACTION_IDENTIFY: &str = "password_reset.identify";
const ACTION_ANSWERS: &str = "password_reset.answers";
const ACTION_COMPLETE: &str = "password_reset.complete";

/// Step one: who is resetting.
#[derive(Debug)]
pub enum IdentifyOutcome {
    IdentityVerified {
        ticket_id: Uuid,
        question_1: String,
        question_2: String,
    },
    NotFound,
    CooldownActive,
}

/// Step two: do they know the answers.
#[derive(Debug)]
pub enum AnswersOutcome {
    QuestionsVerified { ticket_id: Uuid },
    WrongAnswers,
    TicketExpired,
}

/// Step three: the replacement password.
#[derive(Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Completed,
    PasswordUnchanged,
    PasswordReused,
    TicketExpired,
}

impl CredentialEngine {
    /// Start a password reset for the account behind `email`.
    ///
    /// Succeeds only when the account exists and its newest password change
    /// is old enough to clear the cooldown window; an account that has
    /// never changed its password is always eligible. On success a fresh
    /// ticket is minted and the stored question prompts come back with it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable.
    pub async fn identify(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentifyOutcome, EngineError> {
        let result = self.identify_attempt(email, now).await;
        if let Err(err) = &result {
            self.audit
                .record(AuditEvent::fault(now, None, ACTION_IDENTIFY, err));
        }
        result
    }

    async fn identify_attempt(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentifyOutcome, EngineError> {
        let email = normalize_email(email);
        let Some(account) = self.store.find_account_by_email(&email).await? else {
            self.record(
                now,
                None,
                ACTION_IDENTIFY,
                "unknown_account",
                format!("no account for {email}"),
            );
            return Ok(IdentifyOutcome::NotFound);
        };

        if let Some(changed_at) = self.store.latest_password_change(account.account_id).await? {
            if now - changed_at < self.config.cooldown() {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_IDENTIFY,
                    "cooldown",
                    format!("password last changed at {changed_at}"),
                );
                return Ok(IdentifyOutcome::CooldownActive);
            }
        }

        let ticket = self.tickets.create(account.account_id, now).await;
        self.record(
            now,
            Some(account.account_id),
            ACTION_IDENTIFY,
            "identity_verified",
            format!("reset ticket {} issued", ticket.ticket_id),
        );
        Ok(IdentifyOutcome::IdentityVerified {
            ticket_id: ticket.ticket_id,
            question_1: account.security_question_1,
            question_2: account.security_question_2,
        })
    }

    /// Verify both security answers for a stage-one ticket.
    ///
    /// Both answers are always checked before any failure is reported. A
    /// wrong pair leaves the ticket where it is, so the caller may retry
    /// until the ticket expires; a correct pair advances the ticket and
    /// refreshes its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable or hashing
    /// fails.
    pub async fn verify_answers(
        &self,
        ticket_id: Uuid,
        answer_1: &SecretString,
        answer_2: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<AnswersOutcome, EngineError> {
        let result = self.answers_attempt(ticket_id, answer_1, answer_2, now).await;
        if let Err(err) = &result {
            self.audit
                .record(AuditEvent::fault(now, None, ACTION_ANSWERS, err));
        }
        result
    }

    async fn answers_attempt(
        &self,
        ticket_id: Uuid,
        answer_1: &SecretString,
        answer_2: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<AnswersOutcome, EngineError> {
        let Some(account) = self
            .ticket_account(ticket_id, TicketStage::IdentityVerified, ACTION_ANSWERS, now)
            .await?
        else {
            return Ok(AnswersOutcome::TicketExpired);
        };

        let first =
            password::verify_blocking(&self.hasher, answer_1, &account.security_answer_1_hash)
                .await?;
        let second =
            password::verify_blocking(&self.hasher, answer_2, &account.security_answer_2_hash)
                .await?;
        if !(first && second) {
            self.record(
                now,
                Some(account.account_id),
                ACTION_ANSWERS,
                "wrong_answers",
                "one or both answers did not match".to_string(),
            );
            return Ok(AnswersOutcome::WrongAnswers);
        }

        match self.tickets.advance(ticket_id, now).await {
            Some(ticket) => {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_ANSWERS,
                    "questions_verified",
                    format!("ticket {} advanced", ticket.ticket_id),
                );
                Ok(AnswersOutcome::QuestionsVerified {
                    ticket_id: ticket.ticket_id,
                })
            }
            // Expired or advanced elsewhere between read and write.
            None => {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_ANSWERS,
                    "ticket_expired",
                    format!("ticket {ticket_id} no longer live"),
                );
                Ok(AnswersOutcome::TicketExpired)
            }
        }
    }

    /// Replace the password behind a stage-two ticket.
    ///
    /// The new password must differ from the current one and from every
    /// archived hash. On success the outgoing hash is archived and replaced
    /// in one guarded store write, and the ticket is consumed; a rejected
    /// password leaves the ticket live for another try.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable, hashing
    /// fails, or the account's hash moved underneath the reset.
    pub async fn complete_reset(
        &self,
        ticket_id: Uuid,
        new_password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, EngineError> {
        let result = self.complete_attempt(ticket_id, new_password, now).await;
        if let Err(err) = &result {
            self.audit
                .record(AuditEvent::fault(now, None, ACTION_COMPLETE, err));
        }
        result
    }

    async fn complete_attempt(
        &self,
        ticket_id: Uuid,
        new_password: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, EngineError> {
        let Some(account) = self
            .ticket_account(ticket_id, TicketStage::QuestionsVerified, ACTION_COMPLETE, now)
            .await?
        else {
            return Ok(ResetOutcome::TicketExpired);
        };

        if password::verify_blocking(&self.hasher, new_password, &account.password_hash).await? {
            self.record(
                now,
                Some(account.account_id),
                ACTION_COMPLETE,
                "password_unchanged",
                "new password matches the current one".to_string(),
            );
            return Ok(ResetOutcome::PasswordUnchanged);
        }
        for entry in self.store.password_history(account.account_id).await? {
            if password::verify_blocking(&self.hasher, new_password, &entry.password_hash).await? {
                self.record(
                    now,
                    Some(account.account_id),
                    ACTION_COMPLETE,
                    "password_reused",
                    format!("matches a hash archived at {}", entry.changed_at),
                );
                return Ok(ResetOutcome::PasswordReused);
            }
        }

        let new_hash = password::hash_blocking(&self.hasher, new_password).await?;
        if !self
            .store
            .update_password(account.account_id, &account.password_hash, &new_hash, now)
            .await?
        {
            // The hash moved underneath us; this ticket no longer speaks
            // for the account's current credentials.
            self.tickets.remove(ticket_id).await;
            return Err(EngineError::StoreUnavailable(StoreError::message(
                "password changed while the reset was in flight",
            )));
        }

        self.tickets.remove(ticket_id).await;
        self.record(
            now,
            Some(account.account_id),
            ACTION_COMPLETE,
            "completed",
            "password replaced, prior hash archived".to_string(),
        );
        Ok(ResetOutcome::Completed)
    }

    /// Resolve a live ticket at the expected stage to its account.
    ///
    /// `None` covers every way the ticket can be unusable: missing,
    /// expired, or sitting at a different stage. The caller cannot tell
    /// these apart, and neither should an attacker probing ticket ids.
    async fn ticket_account(
        &self,
        ticket_id: Uuid,
        stage: TicketStage,
        action: &'static str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, EngineError> {
        let Some(ticket) = self.tickets.get(ticket_id, now).await else {
            self.record(
                now,
                None,
                action,
                "ticket_expired",
                format!("no live ticket {ticket_id}"),
            );
            return Ok(None);
        };
        if ticket.stage != stage {
            self.record(
                now,
                Some(ticket.account_id),
                action,
                "ticket_expired",
                format!("ticket {ticket_id} is at the wrong step"),
            );
            return Ok(None);
        }

        match self.store.find_account_by_id(ticket.account_id).await? {
            Some(account) => Ok(Some(account)),
            None => {
                self.tickets.remove(ticket_id).await;
                self.record(
                    now,
                    Some(ticket.account_id),
                    action,
                    "ticket_expired",
                    "account behind the ticket is gone".to_string(),
                );
                Ok(None)
            }
        }
    }
}
