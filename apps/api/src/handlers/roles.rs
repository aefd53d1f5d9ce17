use std::collections::HashMap;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use warden_core::{RoleId, SessionContext};

use crate::dto::{CreateRoleRequest, RoleResponse, RoleRulesUpdatedResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .rbac_admin_service
        .list_roles(&session)
        .await?
        .iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(role_id): Path<uuid::Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .rbac_admin_service
        .find_role(&session, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(&role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .rbac_admin_service
        .create_role(&session, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(&role))))
}

/// Applies a flat rule submission encoded as JSON key/value pairs.
pub async fn update_role_rules_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(role_id): Path<uuid::Uuid>,
    Json(updates): Json<HashMap<String, String>>,
) -> ApiResult<Json<RoleRulesUpdatedResponse>> {
    let outcome = state
        .rbac_admin_service
        .update_role_rules(&session, RoleId::from_uuid(role_id), &updates)
        .await?;

    Ok(Json(RoleRulesUpdatedResponse::from(outcome)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(role_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .rbac_admin_service
        .delete_role(&session, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
