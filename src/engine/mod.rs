//! Credential lifecycle engine.
//!
//! [`CredentialEngine`] is the single entry point callers wire up: login with
//! brute-force lockout, registration, role resolution, and the three-step
//! password recovery flow. It owns no durable state; accounts live behind
//! the [`CredentialStore`] seam and reset tickets in a process-local
//! [`TicketStore`].
//!
//! Every public operation takes the wall-clock `now` as an argument. Lock
//! windows, cooldowns, and ticket deadlines all derive from it, which keeps
//! the decision logic testable without a clock source.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::password::SecretHasher;
use crate::store::CredentialStore;
use crate::ticket::TicketStore;

pub mod config;

mod auth;
mod recovery;
mod registration;
mod roles;

pub use auth::LoginOutcome;
pub use config::EngineConfig;
pub use recovery::{AnswersOutcome, IdentifyOutcome, ResetOutcome};
pub use registration::{NewRegistration, RegisterOutcome};
pub use roles::highest_role;

/// Normalize an email for lookup and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct CredentialEngine {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn SecretHasher>,
    audit: Arc<dyn AuditSink>,
    tickets: TicketStore,
    config: EngineConfig,
}

impl CredentialEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn SecretHasher>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        let tickets = TicketStore::new(config.ticket_ttl());
        Self {
            store,
            hasher,
            audit,
            tickets,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn record(
        &self,
        at: DateTime<Utc>,
        account_id: Option<Uuid>,
        action: &'static str,
        outcome: &'static str,
        message: impl Into<String>,
    ) {
        self.audit
            .record(AuditEvent::new(at, account_id, action, outcome, message));
    }
}
