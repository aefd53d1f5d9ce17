use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/rbac/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}",
            get(handlers::roles::get_role_handler).delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/rbac/roles/{role_id}/rules",
            post(handlers::roles::update_role_rules_handler),
        )
        .route(
            "/api/rbac/access/{scope}",
            get(handlers::access::access_check_handler),
        )
        .route("/rbac/dashboard", post(handlers::dashboard::dashboard_update_handler))
        .route("/rbac/session", get(handlers::session::current_session_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_session_context,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/rbac/logout", post(handlers::session::logout_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .with_state(app_state)
}
