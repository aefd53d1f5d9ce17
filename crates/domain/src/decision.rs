use std::collections::BTreeSet;

use serde::Serialize;

use crate::AccessLevel;

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether the operation is permitted.
    pub allowed: bool,
    /// Level the actor holds for the scope.
    pub effective_level: AccessLevel,
    /// Fields the caller must redact on read or reject on write.
    pub field_restrictions: Option<BTreeSet<String>>,
}

impl AccessDecision {
    /// Allows at `effective_level`, restricting the given fields.
    #[must_use]
    pub fn allow(effective_level: AccessLevel, restricted_fields: BTreeSet<String>) -> Self {
        Self {
            allowed: true,
            effective_level,
            field_restrictions: (!restricted_fields.is_empty()).then_some(restricted_fields),
        }
    }

    /// Allows with full access and no restrictions.
    #[must_use]
    pub fn allow_full() -> Self {
        Self {
            allowed: true,
            effective_level: AccessLevel::Full,
            field_restrictions: None,
        }
    }

    /// Denies, reporting the level the actor holds.
    #[must_use]
    pub fn deny(effective_level: AccessLevel) -> Self {
        Self {
            allowed: false,
            effective_level,
            field_restrictions: None,
        }
    }

    /// Returns whether `field_name` must be redacted or rejected.
    #[must_use]
    pub fn is_field_restricted(&self, field_name: &str) -> bool {
        self.field_restrictions
            .as_ref()
            .is_some_and(|fields| fields.contains(field_name))
    }
}
