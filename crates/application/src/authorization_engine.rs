use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use warden_core::{AppError, AppResult, RoleId, SessionContext};
use warden_domain::{AccessDecision, AccessLevel, RbacError, RbacResult, Role, Scope};

use crate::{RoleCache, RoleRepository, SecurityPolicy};

/// Resolves access decisions for sessions against cached role snapshots.
#[derive(Clone)]
pub struct AuthorizationEngine {
    repository: Arc<dyn RoleRepository>,
    cache: Arc<RoleCache>,
    policy: SecurityPolicy,
}

impl AuthorizationEngine {
    /// Creates an engine over a role repository and a shared cache.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleRepository>,
        cache: Arc<RoleCache>,
        policy: SecurityPolicy,
    ) -> Self {
        Self {
            repository,
            cache,
            policy,
        }
    }

    /// Returns the policy applied to the empty session context.
    #[must_use]
    pub fn policy(&self) -> SecurityPolicy {
        self.policy
    }

    /// Decides whether the session may access `scope` at `required_level`.
    ///
    /// Fails with [`RbacError::RoleNotFound`] when the session's role no longer
    /// exists; callers must treat any error as a denial.
    pub async fn authorize(
        &self,
        session: &SessionContext,
        scope: Scope,
        required_level: AccessLevel,
    ) -> RbacResult<AccessDecision> {
        if session.is_empty() {
            return Ok(self.policy.empty_session_decision(required_level));
        }

        let role = self.resolve_role(session.role_id()).await?;
        let decision = evaluate(&role, scope, required_level);

        debug!(
            actor = %session.actor_id(),
            role = %role.id(),
            scope = %scope,
            required = %required_level,
            allowed = decision.allowed,
            "resolved access decision"
        );

        Ok(decision)
    }

    /// Returns whether access is allowed, treating every failure as a denial.
    pub async fn is_allowed(
        &self,
        session: &SessionContext,
        scope: Scope,
        required_level: AccessLevel,
    ) -> bool {
        match self.authorize(session, scope, required_level).await {
            Ok(decision) => decision.allowed,
            Err(error) => {
                warn!(
                    actor = %session.actor_id(),
                    scope = %scope,
                    %error,
                    "denying access after authorization failure"
                );
                false
            }
        }
    }

    /// Ensures access is allowed, returning the decision for field redaction.
    pub async fn require_access(
        &self,
        session: &SessionContext,
        scope: Scope,
        required_level: AccessLevel,
    ) -> AppResult<AccessDecision> {
        let decision = match self.authorize(session, scope, required_level).await {
            Ok(decision) => decision,
            Err(RbacError::RoleNotFound(role_id)) => {
                warn!(actor = %session.actor_id(), role = %role_id, "session role vanished");
                AccessDecision::deny(AccessLevel::None)
            }
            Err(error) => return Err(error.into()),
        };

        if !decision.allowed {
            return Err(AppError::Forbidden(format!(
                "actor '{}' lacks {} access to scope '{}'",
                session.username(),
                required_level,
                scope
            )));
        }

        Ok(decision)
    }

    /// Drops the cached snapshot for a role, waiting for in-flight loads.
    pub async fn invalidate(&self, role_id: RoleId) {
        self.cache.invalidate(role_id).await;
    }

    /// Returns the current snapshot of a role, loading it on a cache miss.
    pub async fn resolve_role(&self, role_id: RoleId) -> RbacResult<Arc<Role>> {
        if let Some(role) = self.cache.get(role_id).await {
            return Ok(role);
        }

        let guard = self.cache.lock_role(role_id).await;
        if let Some(role) = guard.current() {
            return Ok(role);
        }

        let role = match self.repository.find_role(role_id).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                self.cache.evict(guard).await;
                return Err(RbacError::RoleNotFound(role_id));
            }
            Err(error) => {
                self.cache.evict(guard).await;
                return Err(RbacError::Persistence(error.to_string()));
            }
        };

        debug!(role = %role_id, "loaded role into cache");

        let role = Arc::new(role);
        guard.replace(Arc::clone(&role));
        Ok(role)
    }
}

/// Evaluates one role snapshot without touching the cache.
#[must_use]
pub fn evaluate(role: &Role, scope: Scope, required_level: AccessLevel) -> AccessDecision {
    if role.is_super() {
        return AccessDecision::allow_full();
    }

    let Some(rule) = role.rule_for(scope) else {
        return AccessDecision::deny(AccessLevel::None);
    };

    if !rule.access_level().satisfies(required_level) {
        return AccessDecision::deny(rule.access_level());
    }

    let restricted = rule
        .fields_below(required_level)
        .map(str::to_owned)
        .collect::<BTreeSet<_>>();

    AccessDecision::allow(rule.access_level(), restricted)
}
