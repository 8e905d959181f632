//! User handlers.

use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};

use crate::api::SharedState;
use crate::error::Result;
use crate::models::{Permission, User};
use crate::services::audit_service::ClientInfo;
use crate::services::auth_service::Identity;

pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_users))
}

/// List all users.
#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Missing view_users", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<Vec<User>>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ViewUsers])
        .await?;

    let users = state.store.list_users().await?;
    Ok(Json(users))
}
