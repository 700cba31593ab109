//! # Roles
//!
//! The closed set of account roles. Authorization policy beyond the
//! administrator-count rule is resolved upstream; this crate only needs to
//! know which accounts can perform administrative recovery.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role of an account.
///
/// Adding a variant is a compile error at every exhaustive `match` on
/// `Role`, which is where role-sensitive rules must be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access, including account recovery.
    Administrator,
    /// Manages machines, routes and drivers.
    Manager,
    /// Services machines in the field.
    Driver,
    /// Read-only dashboard access.
    Viewer,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Manager,
        Role::Driver,
        Role::Viewer,
    ];

    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Manager => "manager",
            Self::Driver => "driver",
            Self::Viewer => "viewer",
        }
    }

    /// Whether accounts with this role count towards the minimum
    /// administrator invariant.
    pub fn is_administrator(&self) -> bool {
        match self {
            Self::Administrator => true,
            Self::Manager | Self::Driver | Self::Viewer => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "manager" => Ok(Self::Manager),
            "driver" => Ok(Self::Driver),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}
