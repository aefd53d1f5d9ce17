use thiserror::Error;
use warden_core::{AppError, RoleId};

use crate::{AccessLevel, Scope};

/// Result type for RBAC resolution and reconciliation.
pub type RbacResult<T> = Result<T, RbacError>;

/// Failure kinds raised by the RBAC core.
///
/// Validation kinds are always detected before any persistence write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacError {
    /// The role referenced by a session no longer exists.
    #[error("role '{0}' was not found")]
    RoleNotFound(RoleId),

    /// The role disappeared while a reconciliation was in flight.
    #[error("role '{0}' vanished during reconciliation")]
    RoleVanished(RoleId),

    /// A submission referenced a scope outside the known set, or a malformed key.
    #[error("unknown scope '{0}'")]
    UnknownScope(String),

    /// A submission referenced a field the scope does not declare.
    #[error("unknown field '{field}' for scope '{scope}'")]
    UnknownField {
        /// Scope the field was submitted under.
        scope: Scope,
        /// Submitted field name.
        field: String,
    },

    /// An access level token could not be parsed.
    #[error("invalid access level '{0}'")]
    InvalidAccessLevel(String),

    /// A field rule grants more than its enclosing scope rule.
    #[error(
        "field '{field}' access level {field_level} exceeds scope '{scope}' access level {scope_level}"
    )]
    FieldLevelExceedsScope {
        /// Scope owning the rule.
        scope: Scope,
        /// Offending field.
        field: String,
        /// Level requested for the field.
        field_level: AccessLevel,
        /// Level of the enclosing scope rule.
        scope_level: AccessLevel,
    },

    /// Two rules were supplied for the same scope.
    #[error("duplicate rule for scope '{0}'")]
    DuplicateScopeRule(Scope),

    /// Two field rules were supplied for the same field of one scope.
    #[error("duplicate field rule '{field}' for scope '{scope}'")]
    DuplicateField {
        /// Scope owning the rule.
        scope: Scope,
        /// Repeated field name.
        field: String,
    },

    /// The persistence collaborator failed to commit.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The persistence write did not finish within the configured timeout.
    #[error("persistence write for role '{0}' timed out")]
    PersistenceTimeout(RoleId),
}

impl RbacError {
    /// Returns whether the error comes from submission validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownScope(_)
                | Self::UnknownField { .. }
                | Self::InvalidAccessLevel(_)
                | Self::FieldLevelExceedsScope { .. }
                | Self::DuplicateScopeRule(_)
                | Self::DuplicateField { .. }
        )
    }
}

impl From<RbacError> for AppError {
    fn from(value: RbacError) -> Self {
        match value {
            RbacError::RoleNotFound(_) | RbacError::RoleVanished(_) => {
                AppError::NotFound(value.to_string())
            }
            RbacError::Persistence(_) | RbacError::PersistenceTimeout(_) => {
                AppError::Internal(value.to_string())
            }
            other => AppError::Validation(other.to_string()),
        }
    }
}
