//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent invalid domain values and access-rule failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A stored or submitted enum value is not one of the known variants
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// Principal is not authenticated
    #[error("Authentication required")]
    Unauthenticated,

    /// Principal's role is below the required rank
    #[error("Role {actual} does not satisfy required role {required}")]
    InsufficientRole {
        required: &'static str,
        actual: &'static str,
    },
}

impl DomainError {
    /// Create an unknown value error
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            kind,
            value: value.into(),
        }
    }

    /// Check if this is an access-rule failure
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::InsufficientRole { .. })
    }
}
