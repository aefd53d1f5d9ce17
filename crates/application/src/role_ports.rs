use async_trait::async_trait;

use warden_core::{AppResult, RoleId};
use warden_domain::{Role, RuleSet};

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique ignoring case.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Whether the role bypasses scope rules.
    pub is_super: bool,
    /// Initial rule set.
    pub rules: RuleSet,
}

/// Repository port for role persistence.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Loads one role with its rule set.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Creates a role. Fails with `Conflict` when the name is taken ignoring case.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role>;

    /// Replaces the full rule set of a role in one transaction.
    ///
    /// Fails with `NotFound` when the role no longer exists; nothing is
    /// written on failure.
    async fn save_role_rules(&self, role_id: RoleId, rules: &RuleSet) -> AppResult<()>;

    /// Deletes a role. Fails with `Conflict` while any actor still references it.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;
}
