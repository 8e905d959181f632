//! Persistence seam.
//!
//! The workflow core talks to storage through these traits only. The
//! in-memory implementation backs tests and single-node deployments; a
//! relational implementation would express `decide_*` as
//! `UPDATE ... WHERE id = $1 AND status = 'pending'` and check the
//! affected-row count.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Assignment, AssignmentKind, AuditLogEntry, LeaveRequest, Notification, ReviewDecision, Role,
    SwapRequest, User,
};

/// Filter for audit log queries. All fields are AND-combined; `None`
/// matches everything.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
}

/// User lookup
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn users_by_role(&self, role: Role) -> Result<Vec<User>>;
}

/// Assignment lookup
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn insert_assignment(&self, assignment: Assignment) -> Result<()>;
    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>>;
    async fn assignments_in_course(
        &self,
        course_id: Uuid,
        kind: AssignmentKind,
    ) -> Result<Vec<Assignment>>;
}

/// Leave request persistence
#[async_trait]
pub trait LeaveRequestStore: Send + Sync {
    async fn insert_leave(&self, request: LeaveRequest) -> Result<()>;
    async fn get_leave(&self, id: Uuid) -> Result<Option<LeaveRequest>>;
    async fn list_leave(&self) -> Result<Vec<LeaveRequest>>;
    async fn list_leave_by_requester(&self, requester_id: Uuid) -> Result<Vec<LeaveRequest>>;

    /// Conditional update: applies the decision only while the stored
    /// status is still `pending`. Returns whether a row was updated.
    async fn decide_leave(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer_id: Uuid,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Conditional delete: removes the request only while `pending`.
    /// Returns whether a row was deleted.
    async fn delete_leave_if_pending(&self, id: Uuid) -> Result<bool>;
}

/// Swap request persistence
#[async_trait]
pub trait SwapRequestStore: Send + Sync {
    async fn insert_swap(&self, request: SwapRequest) -> Result<()>;
    async fn get_swap(&self, id: Uuid) -> Result<Option<SwapRequest>>;
    async fn list_swap(&self) -> Result<Vec<SwapRequest>>;
    async fn list_swap_by_requester(&self, requester_id: Uuid) -> Result<Vec<SwapRequest>>;

    /// Pending swaps whose original or proposed assignment matches.
    async fn pending_swaps_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<SwapRequest>>;

    /// Conditional update, same contract as [`LeaveRequestStore::decide_leave`].
    async fn decide_swap(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer_id: Uuid,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn delete_swap_if_pending(&self, id: Uuid) -> Result<bool>;
}

/// Append-only audit log persistence
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append_audit(&self, entry: AuditLogEntry) -> Result<()>;

    /// Newest-first page of matching entries plus the total match count.
    async fn query_audit(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, usize)>;
}

/// Notification persistence. Read-flag and delete are owner-scoped.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: Notification) -> Result<()>;
    async fn notifications_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool>;
    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64>;
    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> Result<bool>;
}

/// Combined store consumed by the services.
pub trait Store:
    UserStore + AssignmentStore + LeaveRequestStore + SwapRequestStore + AuditLogStore + NotificationStore
{
}

impl<T> Store for T where
    T: UserStore
        + AssignmentStore
        + LeaveRequestStore
        + SwapRequestStore
        + AuditLogStore
        + NotificationStore
{
}
