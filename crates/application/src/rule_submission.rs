//! Translation of flat dashboard submissions into typed rule sets.
//!
//! A submission is a full snapshot of the role's visible rule matrix encoded
//! as string pairs:
//!
//! - `<SCOPE>.accessLevel` = `NONE` | `VIEW` | `EDIT` | `FULL`
//! - `<SCOPE>.field.<field_name>` = `NONE` | `VIEW` | `EDIT` | `FULL`
//!
//! The dashboard's role selector ([`ROLE_KEY`]) is ignored. A field override
//! without a matching `accessLevel` entry is checked against `NONE`.

use std::collections::{BTreeMap, HashMap};

use warden_domain::{AccessLevel, FieldRule, RbacError, RbacResult, RuleSet, Scope, ScopeRule};

/// Submission key carrying the edited role id.
pub const ROLE_KEY: &str = "role";

const ACCESS_LEVEL_SEGMENT: &str = "accessLevel";
const FIELD_SEGMENT: &str = "field";

enum SubmissionKey<'a> {
    ScopeLevel(Scope),
    FieldLevel(Scope, &'a str),
}

/// Builds the rule set described by a submission.
///
/// Every entry is validated before anything is built; the first failure
/// rejects the whole submission. Entries are checked in key order so the
/// reported error is deterministic.
pub fn parse_rule_submission(updates: &HashMap<String, String>) -> RbacResult<RuleSet> {
    let ordered = updates
        .iter()
        .filter(|(key, _)| key.as_str() != ROLE_KEY)
        .collect::<BTreeMap<_, _>>();

    let mut scope_levels = BTreeMap::<Scope, AccessLevel>::new();
    let mut field_rules = BTreeMap::<Scope, Vec<FieldRule>>::new();

    for (key, value) in ordered {
        match parse_key(key.as_str())? {
            SubmissionKey::ScopeLevel(scope) => {
                scope_levels.insert(scope, AccessLevel::from_transport(value)?);
            }
            SubmissionKey::FieldLevel(scope, field_name) => {
                field_rules
                    .entry(scope)
                    .or_default()
                    .push(FieldRule::new(field_name, AccessLevel::from_transport(value)?));
            }
        }
    }

    let mut scopes = scope_levels.keys().copied().collect::<Vec<_>>();
    scopes.extend(field_rules.keys().copied());
    scopes.sort();
    scopes.dedup();

    let rules = scopes
        .into_iter()
        .map(|scope| {
            let access_level = scope_levels
                .get(&scope)
                .copied()
                .unwrap_or(AccessLevel::None);
            ScopeRule::new(
                scope,
                access_level,
                field_rules.remove(&scope).unwrap_or_default(),
            )
        })
        .collect::<RbacResult<Vec<_>>>()?;

    RuleSet::new(rules)
}

fn parse_key(key: &str) -> RbacResult<SubmissionKey<'_>> {
    let mut segments = key.splitn(3, '.');
    let scope_token = segments.next().unwrap_or_default();
    let kind = segments.next();
    let field_name = segments.next();

    let scope = Scope::from_transport(scope_token)?;

    match (kind, field_name) {
        (Some(ACCESS_LEVEL_SEGMENT), None) => Ok(SubmissionKey::ScopeLevel(scope)),
        (Some(FIELD_SEGMENT), Some(field_name)) => {
            if !scope.has_field(field_name) {
                return Err(RbacError::UnknownField {
                    scope,
                    field: field_name.to_owned(),
                });
            }
            Ok(SubmissionKey::FieldLevel(scope, field_name))
        }
        _ => Err(RbacError::UnknownScope(key.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use warden_domain::{AccessLevel, RbacError, Scope, ScopeRule};

    use super::{ROLE_KEY, parse_rule_submission};

    fn submission(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn builds_scope_and_field_rules() {
        let updates = submission(&[
            (ROLE_KEY, "6f1c4cf2-0000-0000-0000-000000000000"),
            ("EMPLOYMENT_RECORDS.accessLevel", "EDIT"),
            ("EMPLOYMENT_RECORDS.field.salary", "VIEW"),
            ("RBAC_ADMIN.accessLevel", "view"),
        ]);

        let Ok(rules) = parse_rule_submission(&updates) else {
            panic!("submission should be valid");
        };

        assert_eq!(rules.len(), 2);
        let employment = rules.get(Scope::EmploymentRecords);
        assert_eq!(
            employment.map(ScopeRule::access_level),
            Some(AccessLevel::Edit)
        );
        assert_eq!(
            employment.and_then(|rule| rule.field_level("salary")),
            Some(AccessLevel::View)
        );
        assert_eq!(
            rules.get(Scope::RbacAdmin).map(ScopeRule::access_level),
            Some(AccessLevel::View)
        );
    }

    #[test]
    fn empty_submission_clears_every_scope() {
        let Ok(rules) = parse_rule_submission(&submission(&[(ROLE_KEY, "x")])) else {
            panic!("submission should be valid");
        };
        assert!(rules.is_empty());
    }

    #[test]
    fn rejects_unknown_scope_and_malformed_keys() {
        let unknown = parse_rule_submission(&submission(&[("PAYROLL.accessLevel", "VIEW")]));
        assert_eq!(unknown, Err(RbacError::UnknownScope("PAYROLL".to_owned())));

        let malformed =
            parse_rule_submission(&submission(&[("EMPLOYEE_RECORDS.level", "VIEW")]));
        assert_eq!(
            malformed,
            Err(RbacError::UnknownScope("EMPLOYEE_RECORDS.level".to_owned()))
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let result = parse_rule_submission(&submission(&[
            ("EMPLOYEE_RECORDS.accessLevel", "FULL"),
            ("EMPLOYEE_RECORDS.field.salary", "VIEW"),
        ]));

        assert!(matches!(result, Err(RbacError::UnknownField { .. })));
    }

    #[test]
    fn rejects_invalid_access_level_instead_of_defaulting() {
        let result = parse_rule_submission(&submission(&[
            ("EMPLOYEE_RECORDS.accessLevel", "EDIT"),
            ("SYSTEM_ADMIN.accessLevel", "SUPERUSER"),
        ]));

        assert_eq!(
            result,
            Err(RbacError::InvalidAccessLevel("SUPERUSER".to_owned()))
        );
    }

    #[test]
    fn field_override_without_scope_level_must_not_exceed_none() {
        let result = parse_rule_submission(&submission(&[(
            "EMPLOYMENT_RECORDS.field.salary",
            "VIEW",
        )]));

        assert!(matches!(
            result,
            Err(RbacError::FieldLevelExceedsScope {
                scope_level: AccessLevel::None,
                ..
            })
        ));
    }
}
