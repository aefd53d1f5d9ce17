use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use warden_core::{AppError, SessionContext};

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session context for protected routes.
///
/// With security disabled a missing context becomes the empty context, which
/// the authorization engine evaluates against the configured policy.
pub async fn require_session_context(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let stored = session
        .get::<SessionContext>(SessionContext::SESSION_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session context: {error}")))?;

    let session_context = match stored {
        Some(session_context) => session_context,
        None if !state.security_policy.security_enabled => SessionContext::empty(),
        None => return Err(AppError::Unauthorized("authentication required".to_owned()).into()),
    };

    request.extensions_mut().insert(session_context);
    Ok(next.run(request).await)
}
