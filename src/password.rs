//! Secret hashing for passwords and security-question answers.
//!
//! Everything a user must prove knowledge of goes through the same seam:
//! login passwords, replacement passwords, and recovery answers. Hashing is
//! CPU-bound, so engine code calls the `*_blocking` helpers, which move the
//! work onto the blocking pool instead of a request worker.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use crate::error::HashError;

/// One-way, salted hashing of user secrets.
///
/// `verify` fails closed: a malformed stored hash reads as a non-match, never
/// as an error the caller could mistake for a store fault.
pub trait SecretHasher: Send + Sync {
    /// Hash a secret into a PHC string. Each call salts freshly, so equal
    /// inputs yield different outputs.
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// Constant-time comparison of a secret against a stored PHC string.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Argon2id implementation of [`SecretHasher`].
#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Argon2Hasher {
    /// Hasher with the `argon2` crate defaults, the OWASP argon2id baseline
    /// (19 MiB memory, 2 passes, 1 lane).
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Hasher with custom cost parameters. Tests use small values to stay fast.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidParams`] if the parameters are rejected.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| HashError::InvalidParams(err.to_string()))?;
        Ok(Self { params })
    }

    fn context(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .context()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| HashError::Hashing(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.context()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash a secret on the blocking pool.
///
/// # Errors
///
/// Returns [`HashError`] if hashing fails or the blocking task aborts.
pub async fn hash_blocking(
    hasher: &Arc<dyn SecretHasher>,
    secret: &SecretString,
) -> Result<String, HashError> {
    let hasher = Arc::clone(hasher);
    let secret = secret.expose_secret().to_owned();
    tokio::task::spawn_blocking(move || hasher.hash(&secret))
        .await
        .map_err(|err| HashError::Hashing(format!("hash task aborted: {err}")))?
}

/// Verify a secret against a stored hash on the blocking pool.
///
/// # Errors
///
/// Returns [`HashError`] only if the blocking task aborts; a malformed hash
/// verifies as `false`.
pub async fn verify_blocking(
    hasher: &Arc<dyn SecretHasher>,
    secret: &SecretString,
    hash: &str,
) -> Result<bool, HashError> {
    let hasher = Arc::clone(hasher);
    let secret = secret.expose_secret().to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
        .await
        .map_err(|err| HashError::Hashing(format!("verify task aborted: {err}")))
}
