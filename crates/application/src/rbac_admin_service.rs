use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use warden_core::{AppError, AppResult, RoleId, SessionContext};
use warden_domain::{AccessLevel, Role, Scope};

use crate::{
    AuthorizationEngine, CreateRoleInput, ReconcileOutcome, RoleReconciler, RoleRepository,
};

/// Application service backing the RBAC administration dashboard.
///
/// Every operation authorizes the acting session against `RBAC_ADMIN` before
/// touching roles.
#[derive(Clone)]
pub struct RbacAdminService {
    authorization_engine: AuthorizationEngine,
    reconciler: RoleReconciler,
    repository: Arc<dyn RoleRepository>,
}

impl RbacAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_engine: AuthorizationEngine,
        reconciler: RoleReconciler,
        repository: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            authorization_engine,
            reconciler,
            repository,
        }
    }

    /// Lists roles for the dashboard.
    pub async fn list_roles(&self, session: &SessionContext) -> AppResult<Vec<Role>> {
        self.require_admin(session, AccessLevel::View).await?;
        self.repository.list_roles().await
    }

    /// Returns one role with its rule matrix.
    pub async fn find_role(&self, session: &SessionContext, role_id: RoleId) -> AppResult<Role> {
        self.require_admin(session, AccessLevel::View).await?;
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Creates a role.
    pub async fn create_role(
        &self,
        session: &SessionContext,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        self.require_admin(session, AccessLevel::Edit).await?;

        let role = self.repository.create_role(input).await?;
        info!(
            actor = %session.actor_id(),
            role = %role.id(),
            name = role.name(),
            "created role"
        );

        Ok(role)
    }

    /// Applies a dashboard submission to a role's rule set.
    pub async fn update_role_rules(
        &self,
        session: &SessionContext,
        role_id: RoleId,
        updates: &HashMap<String, String>,
    ) -> AppResult<ReconcileOutcome> {
        self.require_admin(session, AccessLevel::Edit).await?;

        let outcome = self.reconciler.apply_updates(role_id, updates).await?;
        info!(
            actor = %session.actor_id(),
            role = %role_id,
            changed = ?outcome.changed_scopes,
            "updated role rules"
        );

        Ok(outcome)
    }

    /// Deletes a role and drops its cached snapshot.
    pub async fn delete_role(&self, session: &SessionContext, role_id: RoleId) -> AppResult<()> {
        self.require_admin(session, AccessLevel::Full).await?;

        self.repository.delete_role(role_id).await?;
        self.authorization_engine.invalidate(role_id).await;
        info!(actor = %session.actor_id(), role = %role_id, "deleted role");

        Ok(())
    }

    /// Checks that the session may edit role rules.
    pub async fn require_rule_editor(&self, session: &SessionContext) -> AppResult<()> {
        self.require_admin(session, AccessLevel::Edit).await
    }

    async fn require_admin(
        &self,
        session: &SessionContext,
        required_level: AccessLevel,
    ) -> AppResult<()> {
        self.authorization_engine
            .require_access(session, Scope::RbacAdmin, required_level)
            .await
            .map(|_| ())
    }
}
