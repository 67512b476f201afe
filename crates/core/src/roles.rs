//! Role requirements for protected operations.
//!
//! Roles are evaluated only against an [`AuthorizedUser`], i.e. flags the
//! backend returned for the caller.

use std::fmt;

use crate::user::AuthorizedUser;

/// Minimum role a caller must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleRequirement {
    /// Any authenticated user.
    #[default]
    Any,
    /// `is_staff` or `is_superuser`.
    Staff,
    /// `is_superuser` only.
    Superuser,
}

impl RoleRequirement {
    pub fn is_satisfied_by(self, user: &AuthorizedUser) -> bool {
        match self {
            RoleRequirement::Any => true,
            RoleRequirement::Staff => user.is_staff() || user.is_superuser(),
            RoleRequirement::Superuser => user.is_superuser(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleRequirement::Any => "any",
            RoleRequirement::Staff => "staff",
            RoleRequirement::Superuser => "superuser",
        }
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
