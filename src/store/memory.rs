//! In-memory credential store for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::account::{Account, NewAccount, PasswordHistoryEntry, Role};
use crate::error::StoreError;
use crate::store::{AuthStateUpdate, CredentialStore, InsertAccountOutcome};

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    roles: HashMap<Uuid, Vec<Role>>,
    history: HashMap<Uuid, Vec<PasswordHistoryEntry>>,
}

/// Mutex-guarded map store with the same guarded-write semantics as the
/// Postgres implementation. Never reports a fault.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a role to an account. Role grants have no engine operation, so
    /// local setups and tests seed them directly.
    pub async fn grant_role(&self, account_id: Uuid, role: Role) {
        let mut inner = self.inner.lock().await;
        let roles = inner.roles.entry(account_id).or_default();
        if !roles.iter().any(|existing| existing.role_id == role.role_id) {
            roles.push(role);
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.get(&account_id).cloned())
    }

    async fn insert_account(
        &self,
        account: NewAccount,
    ) -> Result<InsertAccountOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner
            .accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Ok(InsertAccountOutcome::DuplicateEmail);
        }
        if inner
            .accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Ok(InsertAccountOutcome::DuplicateUsername);
        }

        let account_id = Uuid::new_v4();
        inner.accounts.insert(
            account_id,
            Account {
                account_id,
                email: account.email,
                username: account.username,
                first_name: account.first_name,
                last_name: account.last_name,
                password_hash: account.password_hash,
                security_question_1: account.security_question_1,
                security_answer_1_hash: account.security_answer_1_hash,
                security_question_2: account.security_question_2,
                security_answer_2_hash: account.security_answer_2_hash,
                failed_attempts: 0,
                locked_until: None,
                last_login: None,
            },
        );
        Ok(InsertAccountOutcome::Created(account_id))
    }

    async fn update_auth_state(
        &self,
        account_id: Uuid,
        update: AuthStateUpdate,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(account) = inner.accounts.get_mut(&account_id) else {
            return Ok(false);
        };
        if account.failed_attempts != update.expected_failed_attempts
            || account.locked_until != update.expected_locked_until
        {
            return Ok(false);
        }
        account.failed_attempts = update.failed_attempts;
        account.locked_until = update.locked_until;
        if let Some(last_login) = update.last_login {
            account.last_login = Some(last_login);
        }
        Ok(true)
    }

    async fn update_password(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(account) = inner.accounts.get_mut(&account_id) else {
            return Ok(false);
        };
        if account.password_hash != expected_hash {
            return Ok(false);
        }
        account.password_hash = new_hash.to_string();
        inner.history.entry(account_id).or_default().push(
            PasswordHistoryEntry {
                account_id,
                password_hash: expected_hash.to_string(),
                changed_at,
            },
        );
        Ok(true)
    }

    async fn list_roles(&self, account_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let inner = self.inner.lock().await;
        let mut roles = inner.roles.get(&account_id).cloned().unwrap_or_default();
        roles.sort_by(|a, b| b.role_id.cmp(&a.role_id));
        Ok(roles)
    }

    async fn password_history(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<PasswordHistoryEntry>, StoreError> {
        let inner = self.inner.lock().await;
        let mut history = inner.history.get(&account_id).cloned().unwrap_or_default();
        history.sort_by_key(|entry| entry.changed_at);
        Ok(history)
    }

    async fn latest_password_change(
        &self,
        account_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .history
            .get(&account_id)
            .and_then(|entries| entries.iter().map(|entry| entry.changed_at).max()))
    }
}
