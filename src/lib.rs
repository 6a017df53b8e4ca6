//! # Kunci (Storefront Authentication & Credential Lifecycle)
//!
//! `kunci` authenticates the users of a multi-role web storefront and owns
//! every change to their credentials: registration, login with brute-force
//! lockout, role-based session privilege, and a guarded "forgot password"
//! flow.
//!
//! ## Lockout
//!
//! Five consecutive failed logins lock an account for five minutes. A locked
//! account rejects every attempt without running the password hash, so the
//! lock also caps the work an attacker can schedule. Attempt counters are
//! updated through compare-and-swap store writes; concurrent failures cannot
//! lose a count.
//!
//! ## Password recovery
//!
//! Recovery is a forward-only, three-step flow bound to one in-process
//! ticket: identify the account (24-hour cooldown after any password
//! change), verify both security answers, then set a new password that
//! matches neither the current hash nor any archived one. Skipping a step
//! reads the same as an expired ticket. Security answers are hashed with
//! the same Argon2id hasher as passwords and never stored in clear.
//!
//! ## Roles
//!
//! Roles are a flat, priority-ordered catalog (higher `role_id` wins). A
//! session always carries the account's single highest assignment; the
//! resolver never caches between logins.
//!
//! The engine is transport-neutral; the bundled `axum` API is one thin
//! caller that maps outcome enums to status codes.

pub mod account;
pub mod api;
pub mod audit;
pub mod cli;
pub mod engine;
pub mod error;
pub mod lockout;
pub mod password;
pub mod store;
pub mod ticket;
