//! Notification inbox handlers.
//!
//! All operations are scoped to the authenticated recipient; one user
//! can never read or mutate another user's notifications.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::middleware::auth::require_identity;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::Notification;
use crate::services::audit_service::ClientInfo;
use crate::services::auth_service::Identity;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/:id", delete(delete_notification))
        .route("/:id/read", post(mark_read))
}

/// List the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    responses((status = 200, description = "Caller's notifications", body = [Notification])),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<Vec<Notification>>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let notifications = state.store.notifications_for(identity.user_id).await?;
    Ok(Json(notifications))
}

/// Mark one notification as read.
#[utoipa::path(
    post,
    path = "/{id}/read",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read", body = Notification),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let updated = state.store.mark_read(id, identity.user_id).await?;
    if !updated {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    let notification = state
        .store
        .notifications_for(identity.user_id)
        .await?
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification))
}

/// Mark all of the caller's notifications as read.
#[utoipa::path(
    post,
    path = "/read-all",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    responses((status = 200, description = "Number of notifications updated")),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<Value>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let updated = state.store.mark_all_read(identity.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Delete one of the caller's notifications.
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let deleted = state.store.delete_notification(id, identity.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
