//! Swap request workflow handlers.
//!
//! Mirrors the leave request surface, plus eligible-target resolution
//! for picking a valid swap counterpart.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::middleware::auth::require_identity;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{AssignmentKind, Permission, ReviewDecision, SwapRequest, User};
use crate::services::audit_service::ClientInfo;
use crate::services::auth_service::Identity;
use crate::services::swap_service::{CreateSwapRequest, SwapStats};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_swap_request).get(list_swap_requests))
        .route("/stats", get(swap_stats))
        .route("/eligible-targets", get(eligible_targets))
        .route("/:id", get(get_swap_request).delete(delete_swap_request))
        .route("/:id/decide", post(decide_swap_request))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSwapRequestDto {
    #[serde(alias = "targetId")]
    pub target_id: Uuid,
    pub kind: AssignmentKind,
    #[serde(alias = "assignmentId")]
    pub assignment_id: Uuid,
    #[serde(alias = "proposedAssignmentId")]
    pub proposed_assignment_id: Option<Uuid>,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideSwapDto {
    pub decision: ReviewDecision,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EligibleTargetsQuery {
    #[serde(alias = "assignmentId")]
    pub assignment_id: Uuid,
    pub kind: AssignmentKind,
}

/// Create a swap request.
#[utoipa::path(
    post,
    path = "/",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    request_body = CreateSwapRequestDto,
    responses(
        (status = 201, description = "Swap request created", body = SwapRequest),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 404, description = "Assignment or target not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_swap_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Json(req): Json<CreateSwapRequestDto>,
) -> Result<(StatusCode, Json<SwapRequest>)> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::RequestSwap])
        .await?;
    let identity = require_identity(&identity)?;

    let request = state
        .swap
        .create(
            identity,
            &client,
            CreateSwapRequest {
                target_id: req.target_id,
                kind: req.kind,
                assignment_id: req.assignment_id,
                proposed_assignment_id: req.proposed_assignment_id,
                reason: req.reason,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// List swap requests visible to the caller.
#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    responses((status = 200, description = "Swap requests", body = [SwapRequest])),
    security(("bearer_auth" = []))
)]
pub async fn list_swap_requests(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<Vec<SwapRequest>>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let requests = state.swap.list_for(identity).await?;
    Ok(Json(requests))
}

/// Users who may serve as the counterpart for a swap.
#[utoipa::path(
    get,
    path = "/eligible-targets",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    params(EligibleTargetsQuery),
    responses(
        (status = 200, description = "Eligible counterpart users", body = [User]),
        (status = 404, description = "Assignment not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn eligible_targets(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Query(query): Query<EligibleTargetsQuery>,
) -> Result<Json<Vec<User>>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::RequestSwap])
        .await?;
    let identity = require_identity(&identity)?;

    let candidates = state
        .swap
        .eligible_targets(identity.user_id, query.assignment_id, query.kind)
        .await?;
    Ok(Json(candidates))
}

/// Get a single swap request.
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    params(("id" = Uuid, Path, description = "Swap request ID")),
    responses(
        (status = 200, description = "Swap request", body = SwapRequest),
        (status = 404, description = "Not found", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_swap_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapRequest>> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let request = state.swap.get(identity, id).await?;
    Ok(Json(request))
}

/// Approve or reject a pending swap request.
#[utoipa::path(
    post,
    path = "/{id}/decide",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    params(("id" = Uuid, Path, description = "Swap request ID")),
    request_body = DecideSwapDto,
    responses(
        (status = 200, description = "Decision applied", body = SwapRequest),
        (status = 403, description = "Neither target nor reviewer", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Already reviewed", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn decide_swap_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecideSwapDto>,
) -> Result<Json<SwapRequest>> {
    // No permission gate here: the named target may decide their own
    // swap without holding approve_application. The service enforces
    // the target-or-reviewer rule.
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    let request = state
        .swap
        .decide(identity, &client, id, req.decision, req.notes)
        .await?;
    Ok(Json(request))
}

/// Delete a pending swap request.
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    params(("id" = Uuid, Path, description = "Swap request ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Not pending", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_swap_request(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.guard.require(identity.as_ref(), &client, &[]).await?;
    let identity = require_identity(&identity)?;

    state.swap.delete(identity, &client, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swap request statistics.
#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/v1/swap-requests",
    tag = "swap",
    responses((status = 200, description = "Counts by status and kind", body = SwapStats)),
    security(("bearer_auth" = []))
)]
pub async fn swap_stats(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<SwapStats>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ViewReports])
        .await?;

    let stats = state.swap.stats().await?;
    Ok(Json(stats))
}
