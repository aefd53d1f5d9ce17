use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use warden_application::{CreateRoleInput, RoleRepository};
use warden_core::{ActorId, AppError, AppResult, RoleId};
use warden_domain::{Role, RuleSet};

#[derive(Default)]
struct InMemoryRoleState {
    roles: HashMap<RoleId, Role>,
    actor_roles: HashMap<ActorId, RoleId>,
}

/// In-memory role repository for local development and tests.
///
/// Every write happens under one lock, so rule replacement is atomic.
#[derive(Default)]
pub struct InMemoryRoleRepository {
    state: RwLock<InMemoryRoleState>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links an actor to a role so the role cannot be deleted.
    pub async fn assign_actor(&self, actor_id: ActorId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        state.actor_roles.insert(actor_id, role_id);
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self
            .state
            .read()
            .await
            .roles
            .values()
            .cloned()
            .collect::<Vec<_>>();
        roles.sort_by_key(|role| role.name().to_lowercase());
        Ok(roles)
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state
            .roles
            .values()
            .any(|role| role.name_matches(input.name.as_str()))
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name.trim()
            )));
        }

        let role = Role::new(
            RoleId::new(),
            input.name,
            input.description,
            input.is_super,
            input.rules,
        )?;
        state.roles.insert(role.id(), role.clone());

        Ok(role)
    }

    async fn save_role_rules(&self, role_id: RoleId, rules: &RuleSet) -> AppResult<()> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        *role = role.with_rules(rules.clone());
        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.actor_roles.values().any(|assigned| *assigned == role_id) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is still assigned to actors"
            )));
        }

        state
            .roles
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}
