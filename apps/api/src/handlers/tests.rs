use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use warden_application::{
    AuthorizationEngine, CreateRoleInput, RbacAdminService, ReconcilerConfig, RoleCache,
    RoleReconciler, RoleRepository, SecurityPolicy,
};
use warden_core::{ActorId, AppError, RoleId, SessionContext};
use warden_domain::{AccessLevel, RuleSet, Scope, ScopeRule};
use tower_sessions::{MemoryStore, Session};
use warden_infrastructure::InMemoryRoleRepository;

use crate::dto::{AccessCheckQuery, CreateRoleRequest};
use crate::state::AppState;

use super::access::access_check_handler;
use super::dashboard::{dashboard_update_handler, role_id_from_form};
use super::roles::{
    create_role_handler, delete_role_handler, list_roles_handler, update_role_rules_handler,
};

async fn seeded_state(policy: SecurityPolicy) -> (AppState, SessionContext, SessionContext) {
    let repository: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::new());
    let cache = Arc::new(RoleCache::new());
    let engine = AuthorizationEngine::new(repository.clone(), cache.clone(), policy);
    let reconciler = RoleReconciler::new(repository.clone(), cache, ReconcilerConfig::default());

    let admin = create(&repository, "Administrator", Scope::RbacAdmin, AccessLevel::Full).await;
    let viewer = create(&repository, "Viewer", Scope::EmployeeRecords, AccessLevel::View).await;

    let state = AppState {
        rbac_admin_service: RbacAdminService::new(engine.clone(), reconciler, repository),
        authorization_engine: engine,
        security_policy: policy,
    };

    (
        state,
        SessionContext::new(ActorId::new(), "admin", admin),
        SessionContext::new(ActorId::new(), "viewer", viewer),
    )
}

async fn create(
    repository: &Arc<dyn RoleRepository>,
    name: &str,
    scope: Scope,
    level: AccessLevel,
) -> RoleId {
    let rules = match RuleSet::new([ScopeRule::scope_only(scope, level)]) {
        Ok(rules) => rules,
        Err(error) => panic!("rule set should be valid: {error}"),
    };

    match repository
        .create_role(CreateRoleInput {
            name: name.to_owned(),
            description: None,
            is_super: false,
            rules,
        })
        .await
    {
        Ok(role) => role.id(),
        Err(error) => panic!("role should be created: {error}"),
    }
}

#[tokio::test]
async fn admin_can_list_roles() {
    let (state, admin, _) = seeded_state(SecurityPolicy::enforced()).await;

    let Ok(Json(roles)) = list_roles_handler(State(state), Extension(admin)).await else {
        panic!("admin should list roles");
    };

    let names = roles.iter().map(|role| role.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Administrator", "Viewer"]);
}

#[tokio::test]
async fn non_admin_listing_is_forbidden() {
    let (state, _, viewer) = seeded_state(SecurityPolicy::enforced()).await;

    let response = list_roles_handler(State(state), Extension(viewer))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_role_returns_created() {
    let (state, admin, _) = seeded_state(SecurityPolicy::enforced()).await;

    let response = create_role_handler(
        State(state),
        Extension(admin),
        Json(CreateRoleRequest {
            name: "Auditor".to_owned(),
            description: Some("reads records".to_owned()),
            is_super: false,
            rules: Vec::new(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn rule_update_changes_the_viewers_access() {
    let (state, admin, viewer) = seeded_state(SecurityPolicy::enforced()).await;
    let updates = HashMap::from([
        ("EMPLOYEE_RECORDS.accessLevel".to_owned(), "EDIT".to_owned()),
        ("EMPLOYEE_RECORDS.field.dob".to_owned(), "VIEW".to_owned()),
    ]);

    let Ok(Json(updated)) = update_role_rules_handler(
        State(state.clone()),
        Extension(admin),
        Path(viewer.role_id().as_uuid()),
        Json(updates),
    )
    .await
    else {
        panic!("rule update should commit");
    };
    assert_eq!(updated.changed_scopes, vec!["EMPLOYEE_RECORDS".to_owned()]);

    let Ok(Json(decision)) = access_check_handler(
        State(state),
        Extension(viewer),
        Path("EMPLOYEE_RECORDS".to_owned()),
        Query(AccessCheckQuery {
            level: Some("EDIT".to_owned()),
        }),
    )
    .await
    else {
        panic!("access check should succeed");
    };

    assert!(decision.allowed);
    assert_eq!(decision.effective_level, "EDIT");
    assert_eq!(decision.restricted_fields, vec!["dob".to_owned()]);
}

#[tokio::test]
async fn invalid_rule_update_is_bad_request() {
    let (state, admin, viewer) = seeded_state(SecurityPolicy::enforced()).await;
    let updates = HashMap::from([("PAYROLL.accessLevel".to_owned(), "VIEW".to_owned())]);

    let response = update_role_rules_handler(
        State(state),
        Extension(admin),
        Path(viewer.role_id().as_uuid()),
        Json(updates),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn access_check_for_unknown_scope_is_bad_request() {
    let (state, _, viewer) = seeded_state(SecurityPolicy::enforced()).await;

    let response = access_check_handler(
        State(state),
        Extension(viewer),
        Path("PAYROLL".to_owned()),
        Query(AccessCheckQuery { level: None }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_session_access_check_follows_disabled_security_level() {
    let (state, _, _) = seeded_state(SecurityPolicy::disabled(AccessLevel::View)).await;

    let Ok(Json(decision)) = access_check_handler(
        State(state),
        Extension(SessionContext::empty()),
        Path("SYSTEM_ADMIN".to_owned()),
        Query(AccessCheckQuery { level: None }),
    )
    .await
    else {
        panic!("access check should succeed");
    };

    assert!(decision.allowed);
    assert_eq!(decision.effective_level, "VIEW");
}

#[tokio::test]
async fn deleting_an_unknown_role_is_not_found() {
    let (state, admin, _) = seeded_state(SecurityPolicy::enforced()).await;

    let response = delete_role_handler(State(state), Extension(admin), Path(uuid::Uuid::new_v4()))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn dashboard_form_requires_a_role_id() {
    let missing = HashMap::from([("SYSTEM_ADMIN.accessLevel".to_owned(), "VIEW".to_owned())]);
    assert!(matches!(
        role_id_from_form(&missing),
        Err(AppError::Validation(_))
    ));

    let malformed = HashMap::from([("role".to_owned(), "not-a-uuid".to_owned())]);
    assert!(matches!(
        role_id_from_form(&malformed),
        Err(AppError::Validation(_))
    ));

    let role_id = RoleId::new();
    let valid = HashMap::from([("role".to_owned(), role_id.to_string())]);
    assert_eq!(role_id_from_form(&valid).ok(), Some(role_id));
}

fn store_backed_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

#[tokio::test]
async fn dashboard_denies_before_reading_the_form_and_clears_the_session() {
    let (state, _, viewer) = seeded_state(SecurityPolicy::enforced()).await;
    let session = store_backed_session();
    assert!(
        session
            .insert(SessionContext::SESSION_KEY, viewer.clone())
            .await
            .is_ok()
    );

    let response = dashboard_update_handler(
        State(state),
        Extension(viewer),
        session.clone(),
        Form(HashMap::from([(
            "SYSTEM_ADMIN.accessLevel".to_owned(),
            "VIEW".to_owned(),
        )])),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(matches!(
        session
            .get::<SessionContext>(SessionContext::SESSION_KEY)
            .await,
        Ok(None)
    ));
}

#[tokio::test]
async fn dashboard_reports_a_missing_role_to_authorized_editors() {
    let (state, admin, _) = seeded_state(SecurityPolicy::enforced()).await;

    let response = dashboard_update_handler(
        State(state),
        Extension(admin),
        store_backed_session(),
        Form(HashMap::from([(
            "SYSTEM_ADMIN.accessLevel".to_owned(),
            "VIEW".to_owned(),
        )])),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
