//! Leave request workflow handlers.
//!
//! Endpoints for creating, listing, reviewing (approve/reject) and
//! deleting leave requests.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::auth::require_identity;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{LeaveRequest, LeaveType, Permission, ReviewDecision};
use crate::services::audit_service::ClientInfo;
use crate::services::auth_service::Identity;
use crate::services::leave_service::{CreateLeaveRequest, LeaveStats};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_leave_request).get(list_leave_requests))
        .route("/stats", get(leave_stats))
        .route("/:id", get(get_leave_request).delete(delete_leave_request))
        .route("/:id/decide", post(decide_leave_request))
}

/// Creation payload; camelCase aliases are accepted at this boundary.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveRequestDto {
    #[serde(alias = "leaveType")]
    pub leave_type: LeaveType,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideRequestDto {
    pub decision: ReviewDecision,
    pub notes: Option<String>,
}

/// Create a leave request.
#[utoipa::path(
    post,
    path = "/",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    request_body = CreateLeaveRequestDto,
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequest),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_leave_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Json(req): Json<CreateLeaveRequestDto>,
) -> Result<(StatusCode, Json<LeaveRequest>)> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::RequestLeave])
        .await?;
    let identity = require_identity(&identity)?;

    let request = state
        .leave
        .create(
            identity,
            &client,
            CreateLeaveRequest {
                leave_type: req.leave_type,
                start_date: req.start_date,
                end_date: req.end_date,
                reason: req.reason,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// List leave requests visible to the caller.
#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    responses((status = 200, description = "Leave requests", body = [LeaveRequest])),
    security(("bearer_auth" = []))
)]
pub async fn list_leave_requests(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<Vec<LeaveRequest>>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let requests = state.leave.list_for(identity).await?;
    Ok(Json(requests))
}

/// Get a single leave request.
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_leave_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let request = state.leave.get(identity, id).await?;
    Ok(Json(request))
}

/// Approve or reject a pending leave request.
#[utoipa::path(
    post,
    path = "/{id}/decide",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    request_body = DecideRequestDto,
    responses(
        (status = 200, description = "Decision applied", body = LeaveRequest),
        (status = 403, description = "Not a reviewer", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Already reviewed", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn decide_leave_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecideRequestDto>,
) -> Result<Json<LeaveRequest>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ApproveApplication])
        .await?;
    let identity = require_identity(&identity)?;

    let request = state
        .leave
        .decide(identity, &client, id, req.decision, req.notes)
        .await?;
    Ok(Json(request))
}

/// Delete a pending leave request.
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Not pending", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_leave_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    state.leave.delete(identity, &client, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave request statistics.
#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/v1/leave-requests",
    tag = "leave",
    responses((status = 200, description = "Counts by status and type", body = LeaveStats)),
    security(("bearer_auth" = []))
)]
pub async fn leave_stats(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<LeaveStats>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ViewReports])
        .await?;

    let stats = state.leave.stats().await?;
    Ok(Json(stats))
}
