//! Audit log handlers. Read-only; entries are appended by the services.

use axum::{
    extract::{Extension, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::dto::{Pagination, PaginationQuery};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{AuditLogEntry, Permission};
use crate::services::audit_service::{AuditStats, ClientInfo};
use crate::services::auth_service::Identity;
use crate::store::AuditFilter;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/stats", get(audit_stats))
}

// Pagination fields are inlined; serde(flatten) breaks non-string
// fields under serde_urlencoded.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuditQuery {
    pub actor: Option<String>,
    pub action: Option<String>,
    #[serde(alias = "entityType")]
    pub entity_type: Option<String>,
    #[serde(alias = "entityId")]
    pub entity_id: Option<Uuid>,
    pub page: Option<u32>,
    #[serde(alias = "perPage")]
    pub per_page: Option<u32>,
}

impl AuditQuery {
    fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogPage {
    pub items: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

/// Query audit log entries, newest first.
#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/v1/audit-logs",
    tag = "audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Matching entries", body = AuditLogPage),
        (status = 403, description = "Missing view_audit_logs", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditLogPage>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ViewAuditLogs])
        .await?;

    let pagination = query.pagination();
    let filter = AuditFilter {
        actor: query.actor,
        action: query.action,
        entity_type: query.entity_type,
        entity_id: query.entity_id,
    };
    let (items, total) = state
        .audit
        .query(&filter, pagination.offset(), pagination.per_page() as usize)
        .await?;

    Ok(Json(AuditLogPage {
        items,
        pagination: Pagination::from_query_and_total(&pagination, total as i64),
    }))
}

/// Aggregate audit statistics.
#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/v1/audit-logs",
    tag = "audit",
    responses((status = 200, description = "Counts by action, entity type and day", body = AuditStats)),
    security(("bearer_auth" = []))
)]
pub async fn audit_stats(
    State(state): State<SharedState>,
    Extension(identity): Extension<Option<Identity>>,
    Extension(client): Extension<ClientInfo>,
) -> Result<Json<AuditStats>> {
    state
        .guard
        .require(identity.as_ref(), &client, &[Permission::ViewAuditLogs])
        .await?;

    let stats = state.audit.stats().await?;
    Ok(Json(stats))
}
