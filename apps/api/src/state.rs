use warden_application::{AuthorizationEngine, RbacAdminService, SecurityPolicy};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rbac_admin_service: RbacAdminService,
    pub authorization_engine: AuthorizationEngine,
    pub security_policy: SecurityPolicy,
}
