//! Swap request model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::assignment::AssignmentKind;
use super::request::RequestStatus;

/// Swap request entity
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub kind: AssignmentKind,
    pub assignment_id: Uuid,
    pub proposed_assignment_id: Option<Uuid>,
    pub reason: String,
    pub status: RequestStatus,
    pub reviewer_id: Option<Uuid>,
    pub reviewer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
