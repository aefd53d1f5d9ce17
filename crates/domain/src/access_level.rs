use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RbacError;

/// Capability tier granted for a scope or field.
///
/// Variants are declared in ascending order so the derived ordering is the
/// capability ordering `NONE < VIEW < EDIT < FULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// No access; the identity for "denied".
    None,
    /// Read-only access.
    View,
    /// Read and write access.
    Edit,
    /// Unrestricted access.
    Full,
}

impl AccessLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::View => "VIEW",
            Self::Edit => "EDIT",
            Self::Full => "FULL",
        }
    }

    /// Returns all levels in ascending order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AccessLevel] = &[
            AccessLevel::None,
            AccessLevel::View,
            AccessLevel::Edit,
            AccessLevel::Full,
        ];

        ALL
    }

    /// Returns whether this level grants at least `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        at_least(required, self)
    }

    /// Parses a transport value into an access level.
    pub fn from_transport(value: &str) -> Result<Self, RbacError> {
        Self::from_str(value)
    }
}

/// Returns true iff `actual` is greater than or equal to `required`.
#[must_use]
pub fn at_least(required: AccessLevel, actual: AccessLevel) -> bool {
    actual >= required
}

impl Display for AccessLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = RbacError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let token = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| RbacError::InvalidAccessLevel(value.to_owned()))
    }
}
