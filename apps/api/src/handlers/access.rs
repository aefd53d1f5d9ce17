use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use warden_core::SessionContext;
use warden_domain::{AccessDecision, AccessLevel, RbacError, Scope};

use crate::dto::{AccessDecisionResponse, AccessCheckQuery};
use crate::error::ApiResult;
use crate::state::AppState;

/// Reports what the current session may do in `scope`.
///
/// Unlike `require_access`, a denial is a regular response here.
pub async fn access_check_handler(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(scope): Path<String>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let scope = Scope::from_str(scope.as_str())?;
    let required_level = match query.level.as_deref() {
        Some(level) => AccessLevel::from_str(level)?,
        None => AccessLevel::View,
    };

    let decision = match state
        .authorization_engine
        .authorize(&session, scope, required_level)
        .await
    {
        Ok(decision) => decision,
        Err(RbacError::RoleNotFound(_)) => AccessDecision::deny(AccessLevel::None),
        Err(error) => return Err(error.into()),
    };

    Ok(Json(AccessDecisionResponse::new(
        scope,
        required_level,
        decision,
    )))
}
