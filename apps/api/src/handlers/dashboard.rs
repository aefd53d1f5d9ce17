use std::collections::HashMap;

use axum::Json;
use axum::extract::{Extension, Form, State};
use tower_sessions::Session;
use tracing::warn;
use warden_application::{ROLE_KEY, ReconcileOutcome};
use warden_core::{AppError, AppResult, RoleId, SessionContext};

use crate::dto::RoleRulesUpdatedResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Handles the dashboard form: the `role` field selects the role and every
/// other field is a rule entry.
///
/// The session is authorized before the form is read. A session that is not
/// allowed to edit roles is cleared.
pub async fn dashboard_update_handler(
    State(state): State<AppState>,
    Extension(session_context): Extension<SessionContext>,
    session: Session,
    Form(updates): Form<HashMap<String, String>>,
) -> ApiResult<Json<RoleRulesUpdatedResponse>> {
    match apply_dashboard_update(&state, &session_context, &updates).await {
        Ok(outcome) => Ok(Json(RoleRulesUpdatedResponse::from(outcome))),
        Err(AppError::Forbidden(message)) => {
            if let Err(error) = session.flush().await {
                warn!(%error, "failed to clear session after denied dashboard update");
            }
            Err(ApiError(AppError::Forbidden(message)))
        }
        Err(error) => Err(error.into()),
    }
}

async fn apply_dashboard_update(
    state: &AppState,
    session_context: &SessionContext,
    updates: &HashMap<String, String>,
) -> AppResult<ReconcileOutcome> {
    state
        .rbac_admin_service
        .require_rule_editor(session_context)
        .await?;
    let role_id = role_id_from_form(updates)?;

    state
        .rbac_admin_service
        .update_role_rules(session_context, role_id, updates)
        .await
}

pub(crate) fn role_id_from_form(updates: &HashMap<String, String>) -> Result<RoleId, AppError> {
    let value = updates
        .get(ROLE_KEY)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("'{ROLE_KEY}' is required")))?;

    uuid::Uuid::parse_str(value)
        .map(RoleId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
}
