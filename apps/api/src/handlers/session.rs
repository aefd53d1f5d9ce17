use axum::Json;
use axum::extract::Extension;
use axum::http::StatusCode;
use tower_sessions::Session;
use warden_core::{AppError, SessionContext};

use crate::dto::SessionResponse;
use crate::error::ApiResult;

pub async fn current_session_handler(
    Extension(session): Extension<SessionContext>,
) -> Json<SessionResponse> {
    Json(SessionResponse::from(&session))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
