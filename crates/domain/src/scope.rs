use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RbacError;

/// Protected resource domain subject to access control.
///
/// The set is closed and known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// Administration of roles and their scope rules.
    RbacAdmin,
    /// System-level administration.
    SystemAdmin,
    /// Employee personal records.
    EmployeeRecords,
    /// Employment contracts and conditions.
    EmploymentRecords,
}

const EMPLOYEE_RECORD_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "dob",
    "honorific",
    "marital_status",
    "contact",
];

const EMPLOYMENT_RECORD_FIELDS: &[&str] = &[
    "status",
    "probation_end_date",
    "work_modality",
    "period",
    "salary",
];

impl Scope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RbacAdmin => "RBAC_ADMIN",
            Self::SystemAdmin => "SYSTEM_ADMIN",
            Self::EmployeeRecords => "EMPLOYEE_RECORDS",
            Self::EmploymentRecords => "EMPLOYMENT_RECORDS",
        }
    }

    /// Returns all known scopes.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Scope] = &[
            Scope::RbacAdmin,
            Scope::SystemAdmin,
            Scope::EmployeeRecords,
            Scope::EmploymentRecords,
        ];

        ALL
    }

    /// Returns the field names that may carry field-level rules.
    #[must_use]
    pub fn known_fields(&self) -> &'static [&'static str] {
        match self {
            Self::RbacAdmin | Self::SystemAdmin => &[],
            Self::EmployeeRecords => EMPLOYEE_RECORD_FIELDS,
            Self::EmploymentRecords => EMPLOYMENT_RECORD_FIELDS,
        }
    }

    /// Returns whether the scope declares `field_name`.
    #[must_use]
    pub fn has_field(&self, field_name: &str) -> bool {
        self.known_fields().contains(&field_name)
    }

    /// Parses a transport value into a scope.
    pub fn from_transport(value: &str) -> Result<Self, RbacError> {
        Self::from_str(value)
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = RbacError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|scope| scope.as_str() == value)
            .ok_or_else(|| RbacError::UnknownScope(value.to_owned()))
    }
}
