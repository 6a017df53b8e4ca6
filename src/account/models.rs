//! Row types shared by the store implementations and the engine.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Full account record as the store holds it.
///
/// Secrets appear only in hashed form: `password_hash` and the two answer
/// hashes are PHC strings, never the clear values.
#[derive(Clone, Debug, FromRow)]
pub struct Account {
    pub account_id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub security_question_1: String,
    pub security_answer_1_hash: String,
    pub security_question_2: String,
    pub security_answer_2_hash: String,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Values for a new account row; all secrets already hashed.
///
/// The store assigns the account id and enforces email/username uniqueness.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub security_question_1: String,
    pub security_answer_1_hash: String,
    pub security_question_2: String,
    pub security_answer_2_hash: String,
}

/// What a successful login hands back for session issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id,
            email: account.email.clone(),
            username: account.username.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            last_login: account.last_login,
        }
    }
}

/// A role in the storefront's flat catalog; higher `role_id` wins.
#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct Role {
    pub role_id: i32,
    pub role_name: String,
}

/// An archived password hash, written when the account hash is replaced.
#[derive(Clone, Debug, FromRow)]
pub struct PasswordHistoryEntry {
    pub account_id: Uuid,
    pub password_hash: String,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_copies_identity_fields() {
        let account = Account {
            account_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            security_question_1: "First pet?".to_string(),
            security_answer_1_hash: "$argon2id$stub".to_string(),
            security_question_2: "Birth city?".to_string(),
            security_answer_2_hash: "$argon2id$stub".to_string(),
            failed_attempts: 2,
            locked_until: None,
            last_login: None,
        };

        let summary = AccountSummary::from(&account);
        assert_eq!(summary.account_id, account.account_id);
        assert_eq!(summary.email, "alice@example.com");
        assert_eq!(summary.username, "alice");
        assert_eq!(summary.last_login, None);
    }
}
