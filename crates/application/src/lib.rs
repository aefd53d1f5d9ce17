//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_engine;
mod rbac_admin_service;
mod role_cache;
mod role_ports;
mod role_reconciler;
mod rule_submission;
mod security_policy;

#[cfg(test)]
mod test_support;

pub use authorization_engine::{AuthorizationEngine, evaluate};
pub use rbac_admin_service::RbacAdminService;
pub use role_cache::{RoleCache, RoleWriteGuard};
pub use role_ports::{CreateRoleInput, RoleRepository};
pub use role_reconciler::{
    DEFAULT_WRITE_TIMEOUT, ReconcileMode, ReconcileOutcome, ReconcilerConfig, RoleReconciler,
};
pub use rule_submission::{ROLE_KEY, parse_rule_submission};
pub use security_policy::SecurityPolicy;
