use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::{AccessLevel, RbacError, RbacResult, Scope};

/// Field-level override inside a scope rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field name, unique within its scope rule.
    pub field_name: String,
    /// Access level granted for the field.
    pub access_level: AccessLevel,
}

impl FieldRule {
    /// Creates a field rule.
    #[must_use]
    pub fn new(field_name: impl Into<String>, access_level: AccessLevel) -> Self {
        Self {
            field_name: field_name.into(),
            access_level,
        }
    }
}

/// Access level a role grants for one scope, with optional field overrides.
///
/// Field overrides may only narrow the scope level. The invariant is checked
/// on construction so an invalid rule can never be observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeRule {
    scope: Scope,
    access_level: AccessLevel,
    field_rules: BTreeMap<String, AccessLevel>,
}

impl ScopeRule {
    /// Creates a validated scope rule.
    pub fn new(
        scope: Scope,
        access_level: AccessLevel,
        field_rules: impl IntoIterator<Item = FieldRule>,
    ) -> RbacResult<Self> {
        let mut fields = BTreeMap::new();

        for field_rule in field_rules {
            if field_rule.access_level > access_level {
                return Err(RbacError::FieldLevelExceedsScope {
                    scope,
                    field: field_rule.field_name,
                    field_level: field_rule.access_level,
                    scope_level: access_level,
                });
            }

            if !scope.has_field(field_rule.field_name.as_str()) {
                return Err(RbacError::UnknownField {
                    scope,
                    field: field_rule.field_name,
                });
            }

            match fields.entry(field_rule.field_name) {
                Entry::Occupied(entry) => {
                    return Err(RbacError::DuplicateField {
                        scope,
                        field: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(field_rule.access_level);
                }
            }
        }

        Ok(Self {
            scope,
            access_level,
            field_rules: fields,
        })
    }

    /// Creates a scope rule without field overrides.
    #[must_use]
    pub fn scope_only(scope: Scope, access_level: AccessLevel) -> Self {
        Self {
            scope,
            access_level,
            field_rules: BTreeMap::new(),
        }
    }

    /// Returns the protected scope.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the scope-wide access level.
    #[must_use]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Returns whether the rule carries field-level overrides.
    #[must_use]
    pub fn has_field_rules(&self) -> bool {
        !self.field_rules.is_empty()
    }

    /// Returns the access level for one field, if overridden.
    #[must_use]
    pub fn field_level(&self, field_name: &str) -> Option<AccessLevel> {
        self.field_rules.get(field_name).copied()
    }

    /// Iterates field overrides in field-name order.
    pub fn field_rules(&self) -> impl Iterator<Item = FieldRule> + '_ {
        self.field_rules
            .iter()
            .map(|(field_name, access_level)| FieldRule::new(field_name.clone(), *access_level))
    }

    /// Returns the overridden fields whose level is below `required`.
    pub fn fields_below(&self, required: AccessLevel) -> impl Iterator<Item = &str> + '_ {
        self.field_rules
            .iter()
            .filter(move |(_, level)| !level.satisfies(required))
            .map(|(field_name, _)| field_name.as_str())
    }
}

/// Rule set of one role, holding at most one rule per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    rules: BTreeMap<Scope, ScopeRule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a rule set, rejecting duplicate scopes.
    pub fn new(rules: impl IntoIterator<Item = ScopeRule>) -> RbacResult<Self> {
        let mut by_scope = BTreeMap::new();
        for rule in rules {
            let scope = rule.scope();
            if by_scope.insert(scope, rule).is_some() {
                return Err(RbacError::DuplicateScopeRule(scope));
            }
        }

        Ok(Self { rules: by_scope })
    }

    /// Returns the rule for `scope`, if any.
    #[must_use]
    pub fn get(&self, scope: Scope) -> Option<&ScopeRule> {
        self.rules.get(&scope)
    }

    /// Iterates rules in scope order.
    pub fn iter(&self) -> impl Iterator<Item = &ScopeRule> + '_ {
        self.rules.values()
    }

    /// Returns the scopes that carry a rule.
    pub fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.rules.keys().copied()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a copy where every rule in `overrides` replaces the rule for its scope.
    #[must_use]
    pub fn overlay(&self, overrides: &RuleSet) -> Self {
        let mut rules = self.rules.clone();
        for rule in overrides.iter() {
            rules.insert(rule.scope(), rule.clone());
        }

        Self { rules }
    }

    /// Returns the scopes whose rule differs between `self` and `other`.
    #[must_use]
    pub fn changed_scopes(&self, other: &RuleSet) -> Vec<Scope> {
        Scope::all()
            .iter()
            .copied()
            .filter(|scope| self.get(*scope) != other.get(*scope))
            .collect()
    }
}
