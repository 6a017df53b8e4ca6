//! Account records, roles, and password history.

pub mod models;

pub use models::{Account, AccountSummary, NewAccount, PasswordHistoryEntry, Role};
