//! Session privilege from role assignments.

use crate::account::Role;

/// Pick the highest-privilege role from an account's assignments.
///
/// Privilege is the `role_id` ordering; an account with no assignments has
/// no role. The catalog itself is data, not code: nothing here knows which
/// ids exist.
#[must_use]
pub fn highest_role(roles: &[Role]) -> Option<Role> {
    roles.iter().max_by_key(|role| role.role_id).cloned()
}
