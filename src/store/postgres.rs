//! Postgres-backed credential store.
//!
//! Every guarded write is a single conditional statement (or one
//! transaction), so concurrent logins and password changes resolve in the
//! database rather than in engine code. Uniqueness races surface as SQLSTATE
//! 23505 and map onto [`InsertAccountOutcome`] by violated constraint.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::account::{Account, NewAccount, PasswordHistoryEntry, Role};
use crate::error::StoreError;
use crate::store::{AuthStateUpdate, CredentialStore, InsertAccountOutcome};

const ACCOUNT_COLUMNS: &str = r"
    account_id, email, username, first_name, last_name, password_hash,
    security_question_1, security_answer_1_hash,
    security_question_2, security_answer_2_hash,
    failed_attempts, locked_until, last_login
";

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_account(
        &self,
        column: &str,
        query: &str,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let account = sqlx::query_as::<_, Account>(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .with_context(|| format!("failed to look up account by {column}"))?;
        Ok(account)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query =
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        self.find_account("email", &query, email).await
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let query =
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1");
        self.find_account("username", &query, username).await
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let query =
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up account by id")?;
        Ok(account)
    }

    async fn insert_account(
        &self,
        account: NewAccount,
    ) -> Result<InsertAccountOutcome, StoreError> {
        let query = r"
            INSERT INTO accounts
                (email, username, first_name, last_name, password_hash,
                 security_question_1, security_answer_1_hash,
                 security_question_2, security_answer_2_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING account_id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&account.email)
            .bind(&account.username)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.password_hash)
            .bind(&account.security_question_1)
            .bind(&account.security_answer_1_hash)
            .bind(&account.security_question_2)
            .bind(&account.security_answer_2_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(InsertAccountOutcome::Created(row.get("account_id"))),
            Err(err) if is_unique_violation(&err) => Ok(duplicate_outcome(&err)),
            Err(err) => Err(anyhow::Error::from(err)
                .context("failed to insert account")
                .into()),
        }
    }

    async fn update_auth_state(
        &self,
        account_id: Uuid,
        update: AuthStateUpdate,
    ) -> Result<bool, StoreError> {
        // IS NOT DISTINCT FROM makes the NULL lock state part of the guard.
        let query = r"
            UPDATE accounts
            SET failed_attempts = $2,
                locked_until = $3,
                last_login = COALESCE($4, last_login)
            WHERE account_id = $1
              AND failed_attempts = $5
              AND locked_until IS NOT DISTINCT FROM $6
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(update.failed_attempts)
            .bind(update.locked_until)
            .bind(update.last_login)
            .bind(update.expected_failed_attempts)
            .bind(update.expected_locked_until)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update auth state")?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_password(
        &self,
        account_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Archive and overwrite share one transaction; both statements carry
        // the expected-hash guard, and neither survives without the other.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin password change transaction")?;

        let query = r"
            INSERT INTO password_history (account_id, password_hash, changed_at)
            SELECT account_id, password_hash, $3
            FROM accounts
            WHERE account_id = $1
              AND password_hash = $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let archived = sqlx::query(query)
            .bind(account_id)
            .bind(expected_hash)
            .bind(changed_at)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to archive password hash")?;

        if archived.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Ok(false);
        }

        let query = r"
            UPDATE accounts
            SET password_hash = $3
            WHERE account_id = $1
              AND password_hash = $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let replaced = sqlx::query(query)
            .bind(account_id)
            .bind(expected_hash)
            .bind(new_hash)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to replace password hash")?;

        if replaced.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Ok(false);
        }

        tx.commit()
            .await
            .context("commit password change transaction")?;
        Ok(true)
    }

    async fn list_roles(&self, account_id: Uuid) -> Result<Vec<Role>, StoreError> {
        let query = r"
            SELECT roles.role_id, roles.role_name
            FROM role_assignments
            JOIN roles ON roles.role_id = role_assignments.role_id
            WHERE role_assignments.account_id = $1
            ORDER BY roles.role_id DESC
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let roles = sqlx::query_as::<_, Role>(query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list role assignments")?;
        Ok(roles)
    }

    async fn password_history(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<PasswordHistoryEntry>, StoreError> {
        let query = r"
            SELECT account_id, password_hash, changed_at
            FROM password_history
            WHERE account_id = $1
            ORDER BY changed_at ASC
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let history = sqlx::query_as::<_, PasswordHistoryEntry>(query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to read password history")?;
        Ok(history)
    }

    async fn latest_password_change(
        &self,
        account_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let query = r"
            SELECT changed_at
            FROM password_history
            WHERE account_id = $1
            ORDER BY changed_at DESC
            LIMIT 1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to read latest password change")?;
        Ok(row.map(|row| row.get("changed_at")))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Map a unique violation to the duplicated column.
///
/// Constraint names follow the Postgres default for unique columns:
/// `accounts_email_key` and `accounts_username_key`.
fn duplicate_outcome(err: &sqlx::Error) -> InsertAccountOutcome {
    let constraint = match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    };
    match constraint {
        Some(name) if name.contains("username") => InsertAccountOutcome::DuplicateUsername,
        _ => InsertAccountOutcome::DuplicateEmail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn db_error(code: Option<&'static str>, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(TestDbError { code, constraint }))
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        assert!(is_unique_violation(&db_error(Some("23505"), None)));
        assert!(!is_unique_violation(&db_error(Some("99999"), None)));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn duplicate_outcome_follows_the_constraint_name() {
        assert!(matches!(
            duplicate_outcome(&db_error(Some("23505"), Some("accounts_username_key"))),
            InsertAccountOutcome::DuplicateUsername
        ));
        assert!(matches!(
            duplicate_outcome(&db_error(Some("23505"), Some("accounts_email_key"))),
            InsertAccountOutcome::DuplicateEmail
        ));
        // Unknown constraint reads as the email conflict, the first pre-check.
        assert!(matches!(
            duplicate_outcome(&db_error(Some("23505"), None)),
            InsertAccountOutcome::DuplicateEmail
        ));
    }

    #[tokio::test]
    async fn store_constructs_on_a_lazy_pool() {
        let pool = PgPool::connect_lazy("postgres://localhost:5432/kunci")
            .expect("lazy pool");
        let _store = PgCredentialStore::new(pool);
    }
}
