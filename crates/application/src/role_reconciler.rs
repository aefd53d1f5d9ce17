use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use warden_core::{AppError, RoleId};
use warden_domain::{RbacError, RbacResult, Role, Scope};

use crate::{RoleCache, RoleRepository, parse_rule_submission};

/// Default upper bound for one rule-set write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// How a submission combines with the committed rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// The submission is the complete rule matrix; omitted scopes are cleared.
    #[default]
    Snapshot,
    /// Only submitted scopes change; omitted scopes keep their committed rule.
    Patch,
}

impl ReconcileMode {
    /// Returns a stable configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Patch => "patch",
        }
    }
}

impl FromStr for ReconcileMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "snapshot" => Ok(Self::Snapshot),
            "patch" => Ok(Self::Patch),
            other => Err(AppError::Validation(format!(
                "reconcile mode must be either 'snapshot' or 'patch', got '{other}'"
            ))),
        }
    }
}

/// Reconciler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Merge semantics for submissions.
    pub mode: ReconcileMode,
    /// Upper bound for the persistence write.
    pub write_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            mode: ReconcileMode::default(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Result of a committed reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Snapshot published to the cache.
    pub role: Arc<Role>,
    /// Scopes whose rule changed.
    pub changed_scopes: Vec<Scope>,
}

/// Applies administrative submissions to a role's rule set.
///
/// Callers must authorize the acting session for `RBAC_ADMIN` at `EDIT` or
/// above first; [`crate::RbacAdminService`] does so.
#[derive(Clone)]
pub struct RoleReconciler {
    repository: Arc<dyn RoleRepository>,
    cache: Arc<RoleCache>,
    config: ReconcilerConfig,
}

impl RoleReconciler {
    /// Creates a reconciler sharing the engine's role cache.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleRepository>,
        cache: Arc<RoleCache>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    /// Returns the reconciler configuration.
    #[must_use]
    pub fn config(&self) -> ReconcilerConfig {
        self.config
    }

    /// Validates, persists and publishes a submission using the configured timeout.
    pub async fn apply_updates(
        &self,
        role_id: RoleId,
        updates: &HashMap<String, String>,
    ) -> RbacResult<ReconcileOutcome> {
        self.apply_updates_within(role_id, updates, self.config.write_timeout)
            .await
    }

    /// Validates, persists and publishes a submission.
    ///
    /// Validation happens before any write. Reconciliations of the same role
    /// are serialized; the cache is replaced only after the write commits. A
    /// timed-out write leaves the outcome unknown, so the cached snapshot is
    /// dropped and the next read reloads the stored rules.
    pub async fn apply_updates_within(
        &self,
        role_id: RoleId,
        updates: &HashMap<String, String>,
        write_timeout: Duration,
    ) -> RbacResult<ReconcileOutcome> {
        let submitted = parse_rule_submission(updates).inspect_err(|error| {
            warn!(role = %role_id, %error, "rejected role rule submission");
        })?;

        let guard = self.cache.lock_role(role_id).await;

        let committed = match self.repository.find_role(role_id).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                self.cache.evict(guard).await;
                return Err(RbacError::RoleVanished(role_id));
            }
            Err(error) => return Err(persistence_error(role_id, error)),
        };

        let next_rules = match self.config.mode {
            ReconcileMode::Snapshot => submitted,
            ReconcileMode::Patch => committed.rules().overlay(&submitted),
        };
        let changed_scopes = committed.rules().changed_scopes(&next_rules);

        match tokio::time::timeout(
            write_timeout,
            self.repository.save_role_rules(role_id, &next_rules),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                let error = persistence_error(role_id, error);
                if matches!(error, RbacError::RoleVanished(_)) {
                    self.cache.evict(guard).await;
                }
                return Err(error);
            }
            Err(_) => {
                // The write may have committed before the deadline fired.
                guard.clear();
                warn!(role = %role_id, ?write_timeout, "role rule write timed out");
                return Err(RbacError::PersistenceTimeout(role_id));
            }
        }

        let role = Arc::new(committed.with_rules(next_rules));
        guard.replace(Arc::clone(&role));

        info!(
            role = %role_id,
            mode = self.config.mode.as_str(),
            changed = changed_scopes.len(),
            "committed role rule set"
        );

        Ok(ReconcileOutcome {
            role,
            changed_scopes,
        })
    }
}

fn persistence_error(role_id: RoleId, error: AppError) -> RbacError {
    match error {
        AppError::NotFound(_) => RbacError::RoleVanished(role_id),
        other => RbacError::Persistence(other.to_string()),
    }
}
