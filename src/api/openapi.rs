//! OpenAPI documentation.

use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::api::dto::Pagination;
use crate::api::handlers;
use crate::models::{
    Assignment, AssignmentKind, AuditLogEntry, LeaveRequest, LeaveType, Notification, Permission,
    RequestStatus, ReviewDecision, Role, SwapRequest, User,
};
use crate::services::audit_service::AuditStats;
use crate::services::leave_service::LeaveStats;
use crate::services::swap_service::SwapStats;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable error code, e.g. `FORBIDDEN`
    pub code: String,
    pub message: String,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TA Desk API",
        description = "Authorization, leave and swap request workflows for teaching assistant management",
    ),
    paths(
        handlers::health::health_check,
        handlers::auth::login,
        handlers::users::list_users,
        handlers::leave::create_leave_request,
        handlers::leave::list_leave_requests,
        handlers::leave::get_leave_request,
        handlers::leave::decide_leave_request,
        handlers::leave::delete_leave_request,
        handlers::leave::leave_stats,
        handlers::swap::create_swap_request,
        handlers::swap::list_swap_requests,
        handlers::swap::eligible_targets,
        handlers::swap::get_swap_request,
        handlers::swap::decide_swap_request,
        handlers::swap::delete_swap_request,
        handlers::swap::swap_stats,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::notifications::delete_notification,
        handlers::audit::list_audit_logs,
        handlers::audit::audit_stats,
    ),
    components(schemas(
        ErrorResponse,
        Pagination,
        Role,
        Permission,
        User,
        Assignment,
        AssignmentKind,
        RequestStatus,
        ReviewDecision,
        LeaveType,
        LeaveRequest,
        SwapRequest,
        AuditLogEntry,
        Notification,
        LeaveStats,
        SwapStats,
        AuditStats,
        handlers::auth::LoginRequest,
        handlers::auth::LoginResponse,
        handlers::leave::CreateLeaveRequestDto,
        handlers::leave::DecideRequestDto,
        handlers::swap::CreateSwapRequestDto,
        handlers::swap::DecideSwapDto,
        handlers::audit::AuditLogPage,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Authentication"),
        (name = "users", description = "User directory"),
        (name = "leave", description = "Leave request workflow"),
        (name = "swap", description = "Swap request workflow"),
        (name = "notifications", description = "Notification inbox"),
        (name = "audit", description = "Audit log"),
    )
)]
pub struct ApiDoc;

pub fn build_openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
