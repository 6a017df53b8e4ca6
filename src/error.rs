//! Fault types for the credential engine.
//!
//! Business results such as a wrong password, a locked account, or a duplicate
//! email are not errors; every engine operation returns them as outcome enum
//! variants. The types below cover the only conditions that abort an
//! operation: an unreachable store and a failing hash primitive.

use thiserror::Error;

/// Failure reported by a `CredentialStore` implementation.
///
/// Wraps the implementation's own error chain (`sqlx` for the Postgres store)
/// so callers keep full context without depending on the backend.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StoreError(#[from] anyhow::Error);

impl StoreError {
    /// Build a store fault from a bare message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}

/// Failure inside the hashing primitive.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("hashing failed: {0}")]
    Hashing(String),

    #[error("invalid hash parameters: {0}")]
    InvalidParams(String),
}

/// Faults that abort an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The credential store could not complete a read or write.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Password or security-answer hashing failed.
    #[error("hasher failure: {0}")]
    Hasher(#[from] HashError),
}
