//! Route composition.

use axum::{middleware, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{audit, auth, health, leave, notifications, swap, users};
use crate::api::middleware::auth::auth_middleware;
use crate::api::openapi::build_openapi;
use crate::api::SharedState;

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/leave-requests", leave::router())
        .nest("/swap-requests", swap::router())
        .nest("/notifications", notifications::router())
        .nest("/audit-logs", audit::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        // added after the auth layer so the document stays public
        .route("/openapi.json", get(|| async { Json(build_openapi()) }));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
