use warden_core::{AppResult, NonEmptyString, RoleId};

use crate::{RuleSet, Scope, ScopeRule};

/// Named collection of scope rules.
///
/// A role value is an immutable snapshot; rule changes produce a new value
/// through [`Role::with_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    description: Option<String>,
    is_super: bool,
    rules: RuleSet,
}

impl Role {
    /// Creates a role snapshot.
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        description: Option<String>,
        is_super: bool,
        rules: RuleSet,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name.into().trim())?;

        Ok(Self {
            id,
            name,
            description,
            is_super,
            rules,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the optional free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the role bypasses scope rules.
    #[must_use]
    pub fn is_super(&self) -> bool {
        self.is_super
    }

    /// Returns the stored rule set.
    ///
    /// Super roles keep their rules for visibility only.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the rule for `scope`, if any.
    #[must_use]
    pub fn rule_for(&self, scope: Scope) -> Option<&ScopeRule> {
        self.rules.get(scope)
    }

    /// Returns whether `name` refers to this role, ignoring case.
    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.as_str().eq_ignore_ascii_case(name.trim())
    }

    /// Returns a new snapshot with the rule set replaced.
    #[must_use]
    pub fn with_rules(&self, rules: RuleSet) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            is_super: self.is_super,
            rules,
        }
    }
}
