//! Roles and principals
//!
//! Privilege is a strict hierarchy: admin > coordinator > field_officer.
//! A requirement is expressed as the lowest role that may pass.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// User role, ordered by privilege rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FieldOfficer,
    Coordinator,
    Admin,
}

impl Role {
    /// Privilege rank (admin=2, coordinator=1, field_officer=0)
    pub fn rank(self) -> u8 {
        match self {
            Role::FieldOfficer => 0,
            Role::Coordinator => 1,
            Role::Admin => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::FieldOfficer => "field_officer",
            Role::Coordinator => "coordinator",
            Role::Admin => "admin",
        }
    }

    /// Whether this role meets a minimum-role requirement
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "coordinator" => Ok(Role::Coordinator),
            "field_officer" => Ok(Role::FieldOfficer),
            other => Err(DomainError::unknown("role", other)),
        }
    }
}

/// The caller of a request, as resolved by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Authenticated {
        user_id: i64,
        username: String,
        role: Role,
    },
}

impl Principal {
    pub fn authenticated(user_id: i64, username: impl Into<String>, role: Role) -> Self {
        Self::Authenticated {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { role, .. } => Some(*role),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    /// Check this principal against a minimum role.
    ///
    /// Passes only when the principal is authenticated and its role ranks at
    /// or above `required`.
    pub fn authorize(&self, required: Role) -> Result<(), DomainError> {
        match self {
            Self::Anonymous => Err(DomainError::Unauthenticated),
            Self::Authenticated { role, .. } if role.satisfies(required) => Ok(()),
            Self::Authenticated { role, .. } => Err(DomainError::InsufficientRole {
                required: required.as_str(),
                actual: role.as_str(),
            }),
        }
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::Anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::authenticated(1, "someone", role)
    }

    #[test]
    fn test_role_rank_order() {
        assert!(Role::Admin.rank() > Role::Coordinator.rank());
        assert!(Role::Coordinator.rank() > Role::FieldOfficer.rank());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("field_officer".parse::<Role>().unwrap(), Role::FieldOfficer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_requirement() {
        assert!(principal(Role::Admin).authorize(Role::Admin).is_ok());
        assert!(matches!(
            principal(Role::Coordinator).authorize(Role::Admin),
            Err(DomainError::InsufficientRole { .. })
        ));
        assert!(principal(Role::FieldOfficer).authorize(Role::Admin).is_err());
    }

    #[test]
    fn test_coordinator_requirement() {
        assert!(principal(Role::Admin).authorize(Role::Coordinator).is_ok());
        assert!(principal(Role::Coordinator).authorize(Role::Coordinator).is_ok());
        assert!(principal(Role::FieldOfficer).authorize(Role::Coordinator).is_err());
    }

    #[test]
    fn test_field_officer_requirement_admits_everyone_authenticated() {
        for role in [Role::Admin, Role::Coordinator, Role::FieldOfficer] {
            assert!(principal(role).authorize(Role::FieldOfficer).is_ok());
        }
    }

    #[test]
    fn test_anonymous_always_rejected() {
        for required in [Role::Admin, Role::Coordinator, Role::FieldOfficer] {
            assert_eq!(
                Principal::Anonymous.authorize(required),
                Err(DomainError::Unauthenticated)
            );
        }
    }

    #[test]
    fn test_authorize_does_not_mutate() {
        let p = principal(Role::Coordinator);
        let before = p.clone();
        let _ = p.authorize(Role::Admin);
        assert_eq!(p, before);
    }
}
