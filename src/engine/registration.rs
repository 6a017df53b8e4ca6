//! Account registration.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use super::{normalize_email, CredentialEngine};
use crate::account::NewAccount;
use crate::audit::AuditEvent;
use crate::error::EngineError;
use crate::password;
use crate::store::InsertAccountOutcome;

const ACTION_REGISTER: &str = "register";

/// Everything a new account needs; secrets stay wrapped until hashed.
#[derive(Debug)]
pub struct NewRegistration {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: SecretString,
    pub security_question_1: String,
    pub security_answer_1: SecretString,
    pub security_question_2: String,
    pub security_answer_2: SecretString,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created { account_id: Uuid },
    EmailTaken,
    UsernameTaken,
}

impl CredentialEngine {
    /// Register a new account.
    ///
    /// Email and username are pre-checked against the current records, but
    /// the store's own uniqueness enforcement has the final word: a race
    /// between check and insert comes back as the matching `Taken` outcome,
    /// so concurrent registrations yield exactly one `Created`.
    ///
    /// No role is granted here; role assignment is a separate concern.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable or hashing
    /// fails.
    pub async fn register(
        &self,
        registration: NewRegistration,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, EngineError> {
        let result = self.register_attempt(registration, now).await;
        if let Err(err) = &result {
            self.audit
                .record(AuditEvent::fault(now, None, ACTION_REGISTER, err));
        }
        result
    }

    async fn register_attempt(
        &self,
        registration: NewRegistration,
        now: DateTime<Utc>,
    ) -> Result<RegisterOutcome, EngineError> {
        let email = normalize_email(&registration.email);
        let username = registration.username.clone();

        if self.store.find_account_by_email(&email).await?.is_some() {
            self.record(
                now,
                None,
                ACTION_REGISTER,
                "duplicate_email",
                format!("{email} is already registered"),
            );
            return Ok(RegisterOutcome::EmailTaken);
        }
        if self
            .store
            .find_account_by_username(&username)
            .await?
            .is_some()
        {
            self.record(
                now,
                None,
                ACTION_REGISTER,
                "duplicate_username",
                format!("username {username} is already registered"),
            );
            return Ok(RegisterOutcome::UsernameTaken);
        }

        let password_hash = password::hash_blocking(&self.hasher, &registration.password).await?;
        let security_answer_1_hash =
            password::hash_blocking(&self.hasher, &registration.security_answer_1).await?;
        let security_answer_2_hash =
            password::hash_blocking(&self.hasher, &registration.security_answer_2).await?;

        let account = NewAccount {
            email: email.clone(),
            username: registration.username,
            first_name: registration.first_name,
            last_name: registration.last_name,
            password_hash,
            security_question_1: registration.security_question_1,
            security_answer_1_hash,
            security_question_2: registration.security_question_2,
            security_answer_2_hash,
        };

        match self.store.insert_account(account).await? {
            InsertAccountOutcome::Created(account_id) => {
                self.record(
                    now,
                    Some(account_id),
                    ACTION_REGISTER,
                    "created",
                    format!("account created for {email}"),
                );
                Ok(RegisterOutcome::Created { account_id })
            }
            // Lost the race between pre-check and insert.
            InsertAccountOutcome::DuplicateEmail => {
                self.record(
                    now,
                    None,
                    ACTION_REGISTER,
                    "duplicate_email",
                    format!("{email} is already registered"),
                );
                Ok(RegisterOutcome::EmailTaken)
            }
            InsertAccountOutcome::DuplicateUsername => {
                self.record(
                    now,
                    None,
                    ACTION_REGISTER,
                    "duplicate_username",
                    format!("username {username} is already registered"),
                );
                Ok(RegisterOutcome::UsernameTaken)
            }
        }
    }
}
