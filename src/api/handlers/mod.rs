//! HTTP handlers for the credential API.
//!
//! Handlers translate wire payloads into engine calls and engine outcomes
//! into status codes. Input hygiene lives here and only here: the engines
//! accept any secret, so format and length policy belong to this edge.

pub mod health;
pub mod login;
pub mod recovery;
pub mod register;
pub mod root;

use regex::Regex;

/// Shortest password the API accepts, at registration and reset alike.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lightweight email sanity check used before any engine call.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Length floor only; anything beyond that is the user's business.
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
