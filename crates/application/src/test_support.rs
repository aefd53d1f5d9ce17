use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use warden_core::{ActorId, AppError, AppResult, RoleId, SessionContext};
use warden_domain::{AccessLevel, Role, RuleSet, Scope, ScopeRule};

use crate::{
    AuthorizationEngine, CreateRoleInput, ReconcilerConfig, RoleCache, RoleReconciler,
    RoleRepository, SecurityPolicy,
};

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub(crate) roles: Mutex<HashMap<RoleId, Role>>,
    pub(crate) find_calls: AtomicUsize,
    pub(crate) save_calls: AtomicUsize,
    pub(crate) fail_saves: AtomicBool,
    pub(crate) save_delay: Mutex<Option<Duration>>,
    pub(crate) find_delay: Mutex<Option<Duration>>,
    pub(crate) ack_delay: Mutex<Option<Duration>>,
}

impl FakeRoleRepository {
    pub(crate) async fn insert(&self, role: Role) {
        self.roles.lock().await.insert(role.id(), role);
    }

    pub(crate) async fn remove(&self, role_id: RoleId) {
        self.roles.lock().await.remove(&role_id);
    }

    pub(crate) async fn stored_rules(&self, role_id: RoleId) -> Option<RuleSet> {
        self.roles
            .lock()
            .await
            .get(&role_id)
            .map(|role| role.rules().clone())
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.roles.lock().await.get(&role_id).cloned();

        let delay = *self.find_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(found)
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles = self
            .roles
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles.values().any(|role| role.name_matches(input.name.as_str())) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        let role = Role::new(
            RoleId::new(),
            input.name,
            input.description,
            input.is_super,
            input.rules,
        )?;
        roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn save_role_rules(&self, role_id: RoleId, rules: &RuleSet) -> AppResult<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.save_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated write failure".to_owned()));
        }

        let mut roles = self.roles.lock().await;
        let role = roles
            .get(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        let updated = role.with_rules(rules.clone());
        roles.insert(role_id, updated);
        drop(roles);

        let delay = *self.ack_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.roles
            .lock()
            .await
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}

pub(crate) fn role(name: &str, is_super: bool, rules: Vec<ScopeRule>) -> Role {
    let rules = match RuleSet::new(rules) {
        Ok(rules) => rules,
        Err(error) => panic!("invalid test rule set: {error}"),
    };

    match Role::new(RoleId::new(), name, None, is_super, rules) {
        Ok(role) => role,
        Err(error) => panic!("invalid test role: {error}"),
    }
}

pub(crate) fn session_for(role: &Role) -> SessionContext {
    SessionContext::new(ActorId::new(), format!("actor_{}", role.name()), role.id())
}

pub(crate) fn rule(scope: Scope, access_level: AccessLevel) -> ScopeRule {
    ScopeRule::scope_only(scope, access_level)
}

pub(crate) fn submission(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

pub(crate) struct Harness {
    pub(crate) repository: Arc<FakeRoleRepository>,
    pub(crate) cache: Arc<RoleCache>,
    pub(crate) engine: AuthorizationEngine,
    pub(crate) reconciler: RoleReconciler,
}

impl Harness {
    pub(crate) fn new(config: ReconcilerConfig) -> Self {
        let repository = Arc::new(FakeRoleRepository::default());
        let cache = Arc::new(RoleCache::new());
        let engine = AuthorizationEngine::new(
            repository.clone(),
            cache.clone(),
            SecurityPolicy::enforced(),
        );
        let reconciler = RoleReconciler::new(repository.clone(), cache.clone(), config);

        Self {
            repository,
            cache,
            engine,
            reconciler,
        }
    }
}
