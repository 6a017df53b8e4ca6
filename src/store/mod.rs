//! Credential store seam.
//!
//! The engine talks to durable storage through [`CredentialStore`] only. Two
//! implementations ship: [`PgCredentialStore`] for Postgres and
//! [`MemoryCredentialStore`] for tests and local development. Writes that
//! depend on previously read values are guarded compare-and-swap operations,
//! so implementations never lose a concurrent counter bump or password
//! change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::account::{Account, NewAccount, PasswordHistoryEntry, Role};
use crate::error::StoreError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Outcome of an account insert.
///
/// Uniqueness is enforced here, not by callers: a pre-checked registration
/// can still race another insert, and the store resolves it.
#[derive(Debug)]
pub enum InsertAccountOutcome {
    Created(Uuid),
    DuplicateEmail,
    DuplicateUsername,
}

/// Guarded write of an account's attempt counters.
///
/// The write applies only while the row still carries the `expected_*`
/// values. `last_login` of `None` leaves the stored value untouched.
#[derive(Clone, Copy, Debug)]
pub struct AuthStateUpdate {
    pub expected_failed_attempts: i32,
    pub expected_locked_until: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Durable record of accounts, role assignments, and password history.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Look up an account by normalized email.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Look up an account by username.
    async fn find_account_by_username(&self, username: &str)
        -> Result<Option<Account>, StoreError>;

    /// Look up an account by id; recovery tickets reference accounts this way.
    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Insert a new account, resolving uniqueness races.
    async fn insert_account(&self, account: NewAccount)
        -> Result<InsertAccountOutcome, StoreError>;

    /// Apply a guarded counter update; `false` means the guard lost a race.
    async fn update_auth_state(
        &self,
        account_id: Uuid,
        update: AuthStateUpdate,
    ) -> Result<bool, StoreError>;

    /// Replace the password hash, archiving the outgoing hash into history in
    /// the same atomic operation. `false` means `expected_hash` no longer
    /// matched and nothing changed.
    async fn update_password(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// All roles assigned to an account, highest `role_id` first.
    async fn list_roles(&self, account_id: Uuid) -> Result<Vec<Role>, StoreError>;

    /// Archived password hashes, oldest first.
    async fn password_history(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<PasswordHistoryEntry>, StoreError>;

    /// When the password last changed, if it ever has.
    async fn latest_password_change(
        &self,
        account_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}
