use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use warden_application::{CreateRoleInput, ReconcileOutcome};
use warden_core::{AppResult, SessionContext};
use warden_domain::{AccessDecision, AccessLevel, FieldRule, Role, RuleSet, Scope, ScopeRule};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Field-level rule inside a scope rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-rule.ts"
)]
pub struct FieldRuleDto {
    pub field_name: String,
    pub access_level: String,
}

/// Scope rule as exchanged with clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/scope-rule.ts"
)]
pub struct ScopeRuleDto {
    pub scope: String,
    pub access_level: String,
    #[serde(default)]
    pub fields: Vec<FieldRuleDto>,
}

impl From<&ScopeRule> for ScopeRuleDto {
    fn from(value: &ScopeRule) -> Self {
        Self {
            scope: value.scope().as_str().to_owned(),
            access_level: value.access_level().as_str().to_owned(),
            fields: value
                .field_rules()
                .map(|field_rule| FieldRuleDto {
                    field_name: field_rule.field_name,
                    access_level: field_rule.access_level.as_str().to_owned(),
                })
                .collect(),
        }
    }
}

impl ScopeRuleDto {
    fn into_scope_rule(self) -> AppResult<ScopeRule> {
        let scope = Scope::from_str(self.scope.as_str())?;
        let access_level = AccessLevel::from_str(self.access_level.as_str())?;
        let field_rules = self
            .fields
            .into_iter()
            .map(|field| {
                AccessLevel::from_str(field.access_level.as_str())
                    .map(|level| FieldRule::new(field.field_name, level))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScopeRule::new(scope, access_level, field_rules)?)
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_super: bool,
    #[serde(default)]
    pub rules: Vec<ScopeRuleDto>,
}

impl CreateRoleRequest {
    /// Validates the payload into an application input.
    pub fn into_input(self) -> AppResult<CreateRoleInput> {
        let rules = self
            .rules
            .into_iter()
            .map(ScopeRuleDto::into_scope_rule)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CreateRoleInput {
            name: self.name,
            description: self.description,
            is_super: self.is_super,
            rules: RuleSet::new(rules)?,
        })
    }
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_super: bool,
    pub rules: Vec<ScopeRuleDto>,
}

impl From<&Role> for RoleResponse {
    fn from(value: &Role) -> Self {
        Self {
            role_id: value.id().to_string(),
            name: value.name().to_owned(),
            description: value.description().map(str::to_owned),
            is_super: value.is_super(),
            rules: value.rules().iter().map(ScopeRuleDto::from).collect(),
        }
    }
}

/// Result of a committed rule update.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-rules-updated-response.ts"
)]
pub struct RoleRulesUpdatedResponse {
    pub role: RoleResponse,
    pub changed_scopes: Vec<String>,
}

impl From<ReconcileOutcome> for RoleRulesUpdatedResponse {
    fn from(value: ReconcileOutcome) -> Self {
        Self {
            role: RoleResponse::from(value.role.as_ref()),
            changed_scopes: value
                .changed_scopes
                .into_iter()
                .map(|scope| scope.as_str().to_owned())
                .collect(),
        }
    }
}

/// Query parameters for the access check.
#[derive(Debug, Deserialize)]
pub struct AccessCheckQuery {
    pub level: Option<String>,
}

/// Outcome of an access check for the current session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-decision-response.ts"
)]
pub struct AccessDecisionResponse {
    pub scope: String,
    pub required_level: String,
    pub allowed: bool,
    pub effective_level: String,
    pub restricted_fields: Vec<String>,
}

impl AccessDecisionResponse {
    pub fn new(scope: Scope, required_level: AccessLevel, decision: AccessDecision) -> Self {
        Self {
            scope: scope.as_str().to_owned(),
            required_level: required_level.as_str().to_owned(),
            allowed: decision.allowed,
            effective_level: decision.effective_level.as_str().to_owned(),
            restricted_fields: decision
                .field_restrictions
                .map(|fields| fields.into_iter().collect())
                .unwrap_or_default(),
        }
    }
}

/// API representation of the current session context.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub actor_id: String,
    pub username: String,
    pub role_id: String,
    pub is_empty: bool,
}

impl From<&SessionContext> for SessionResponse {
    fn from(value: &SessionContext) -> Self {
        Self {
            actor_id: value.actor_id().to_string(),
            username: value.username().to_owned(),
            role_id: value.role_id().to_string(),
            is_empty: value.is_empty(),
        }
    }
}
