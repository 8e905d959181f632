//! In-memory store.
//!
//! Single-node persistence behind the store traits. All maps live under
//! one `RwLock`, so the conditional decide/delete operations are atomic
//! with respect to concurrent callers: the check and the mutation happen
//! under the same write guard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Assignment, AssignmentKind, AuditLogEntry, LeaveRequest, Notification, RequestStatus,
    ReviewDecision, Role, SwapRequest, User,
};

use super::{
    AssignmentStore, AuditFilter, AuditLogStore, LeaveRequestStore, NotificationStore,
    SwapRequestStore, UserStore,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    assignments: HashMap<Uuid, Assignment>,
    leave_requests: HashMap<Uuid, LeaveRequest>,
    swap_requests: HashMap<Uuid, SwapRequest>,
    audit_log: Vec<AuditLogEntry>,
    notifications: HashMap<Uuid, Notification>,
}

/// In-memory implementation of the store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        self.inner.write().await.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .inner
            .read()
            .await
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn insert_assignment(&self, assignment: Assignment) -> Result<()> {
        self.inner
            .write()
            .await
            .assignments
            .insert(assignment.id, assignment);
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
        Ok(self.inner.read().await.assignments.get(&id).cloned())
    }

    async fn assignments_in_course(
        &self,
        course_id: Uuid,
        kind: AssignmentKind,
    ) -> Result<Vec<Assignment>> {
        let mut assignments: Vec<Assignment> = self
            .inner
            .read()
            .await
            .assignments
            .values()
            .filter(|a| a.course_id == course_id && a.kind == kind)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.id);
        Ok(assignments)
    }
}

#[async_trait]
impl LeaveRequestStore for MemoryStore {
    async fn insert_leave(&self, request: LeaveRequest) -> Result<()> {
        self.inner
            .write()
            .await
            .leave_requests
            .insert(request.id, request);
        Ok(())
    }

    async fn get_leave(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        Ok(self.inner.read().await.leave_requests.get(&id).cloned())
    }

    async fn list_leave(&self) -> Result<Vec<LeaveRequest>> {
        let mut requests: Vec<LeaveRequest> = self
            .inner
            .read()
            .await
            .leave_requests
            .values()
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_leave_by_requester(&self, requester_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let mut requests: Vec<LeaveRequest> = self
            .inner
            .read()
            .await
            .leave_requests
            .values()
            .filter(|r| r.requester_id == requester_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn decide_leave(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer_id: Uuid,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.leave_requests.get_mut(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = decision.as_status();
                request.reviewer_id = Some(reviewer_id);
                request.reviewer_notes = notes;
                request.reviewed_at = Some(reviewed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_leave_if_pending(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.leave_requests.get(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                inner.leave_requests.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SwapRequestStore for MemoryStore {
    async fn insert_swap(&self, request: SwapRequest) -> Result<()> {
        self.inner
            .write()
            .await
            .swap_requests
            .insert(request.id, request);
        Ok(())
    }

    async fn get_swap(&self, id: Uuid) -> Result<Option<SwapRequest>> {
        Ok(self.inner.read().await.swap_requests.get(&id).cloned())
    }

    async fn list_swap(&self) -> Result<Vec<SwapRequest>> {
        let mut requests: Vec<SwapRequest> = self
            .inner
            .read()
            .await
            .swap_requests
            .values()
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_swap_by_requester(&self, requester_id: Uuid) -> Result<Vec<SwapRequest>> {
        let mut requests: Vec<SwapRequest> = self
            .inner
            .read()
            .await
            .swap_requests
            .values()
            .filter(|r| r.requester_id == requester_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn pending_swaps_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<SwapRequest>> {
        let requests: Vec<SwapRequest> = self
            .inner
            .read()
            .await
            .swap_requests
            .values()
            .filter(|r| {
                r.status == RequestStatus::Pending
                    && (r.assignment_id == assignment_id
                        || r.proposed_assignment_id == Some(assignment_id))
            })
            .cloned()
            .collect();
        Ok(requests)
    }

    async fn decide_swap(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer_id: Uuid,
        notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.swap_requests.get_mut(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = decision.as_status();
                request.reviewer_id = Some(reviewer_id);
                request.reviewer_notes = notes;
                request.reviewed_at = Some(reviewed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_swap_if_pending(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.swap_requests.get(&id) {
            Some(request) if request.status == RequestStatus::Pending => {
                inner.swap_requests.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AuditLogStore for MemoryStore {
    async fn append_audit(&self, entry: AuditLogEntry) -> Result<()> {
        self.inner.write().await.audit_log.push(entry);
        Ok(())
    }

    async fn query_audit(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, usize)> {
        let inner = self.inner.read().await;
        let mut matches: Vec<AuditLogEntry> = inner
            .audit_log
            .iter()
            .filter(|e| {
                filter.actor.as_ref().map(|a| &e.actor == a).unwrap_or(true)
                    && filter
                        .action
                        .as_ref()
                        .map(|a| &e.action == a)
                        .unwrap_or(true)
                    && filter
                        .entity_type
                        .as_ref()
                        .map(|t| &e.entity_type == t)
                        .unwrap_or(true)
                    && filter
                        .entity_id
                        .map(|id| e.entity_id == Some(id))
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let page = matches.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: Notification) -> Result<()> {
        self.inner
            .write()
            .await
            .notifications
            .insert(notification.id, notification);
        Ok(())
    }

    async fn notifications_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .inner
            .read()
            .await
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.notifications.get_mut(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut updated = 0;
        for n in inner.notifications.values_mut() {
            if n.recipient_id == recipient_id && !n.read {
                n.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.notifications.get(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                inner.notifications.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
