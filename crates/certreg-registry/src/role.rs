//! # Roles
//!
//! Two privilege levels, ordered so that `>=` answers "may this caller do
//! that". The admin holds [`Role::Admin`]; every other identity holds
//! [`Role::Public`].

use serde::{Deserialize, Serialize};

/// Registry roles, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Anyone. May verify certificates and read the change log.
    Public,
    /// The registry admin. May also issue and revoke.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }

    /// Whether a holder of `self` satisfies a `required` role.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
