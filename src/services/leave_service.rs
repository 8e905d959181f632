//! Leave request workflow.
//!
//! Lifecycle: created `pending` by the requester, then exactly one
//! terminal decision by a reviewer, or deletion while still pending.
//! The decision is serialized through the store's conditional update,
//! so concurrent reviewers cannot both win.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{LeaveRequest, LeaveType, Permission, RequestStatus, ReviewDecision};
use crate::services::audit_service::{
    Actor, AuditAction, AuditEntry, AuditService, ClientInfo, EntityType,
};
use crate::services::auth_service::Identity;
use crate::services::notification_service::NotificationService;
use crate::store::Store;

/// Validated creation payload
#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Counts by status and leave type
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub by_type: HashMap<String, u64>,
}

/// Leave request workflow service
pub struct LeaveService {
    store: Arc<dyn Store>,
    audit: Arc<AuditService>,
    notifier: Arc<NotificationService>,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn Store>,
        audit: Arc<AuditService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
        }
    }

    /// Workflow-level rejections are authorization decisions too and get
    /// the same `authorize_deny` entry the guard writes.
    async fn record_deny(&self, identity: &Identity, client: &ClientInfo, id: Uuid, reason: &str) {
        self.audit
            .record(
                AuditEntry::new(AuditAction::AuthorizeDeny, EntityType::Authorization)
                    .actor(Actor::User(identity.user_id))
                    .entity(id)
                    .description(reason.to_string())
                    .client(client),
            )
            .await;
    }

    /// Create a new leave request; status starts at `pending`.
    pub async fn create(
        &self,
        identity: &Identity,
        client: &ClientInfo,
        input: CreateLeaveRequest,
    ) -> Result<LeaveRequest> {
        if input.reason.trim().is_empty() {
            return Err(AppError::Validation("reason must not be empty".to_string()));
        }
        if input.start_date > input.end_date {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let request = LeaveRequest {
            id: Uuid::new_v4(),
            requester_id: identity.user_id,
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason,
            status: RequestStatus::Pending,
            reviewer_id: None,
            reviewer_notes: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        self.store.insert_leave(request.clone()).await?;

        self.audit
            .record(
                AuditEntry::new(AuditAction::CreateLeaveRequest, EntityType::LeaveRequest)
                    .actor(Actor::User(identity.user_id))
                    .entity(request.id)
                    .description("Leave request created")
                    .metadata(serde_json::json!({
                        "leave_type": request.leave_type.as_str(),
                        "start_date": request.start_date,
                        "end_date": request.end_date,
                    }))
                    .client(client),
            )
            .await;

        tracing::info!(request_id = %request.id, requester = %identity.user_id, "Leave request created");
        Ok(request)
    }

    /// Apply a terminal decision to a pending request.
    pub async fn decide(
        &self,
        identity: &Identity,
        client: &ClientInfo,
        id: Uuid,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> Result<LeaveRequest> {
        if !identity.has_permission(Permission::ApproveApplication) {
            self.record_deny(identity, client, id, "leave decision requires approve_application")
                .await;
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }

        let existing = self
            .store
            .get_leave(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;
        if existing.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Leave request has already been {}",
                existing.status.as_str()
            )));
        }

        // Conditional update; the loser of a concurrent race lands here
        // with `updated == false`.
        let updated = self
            .store
            .decide_leave(id, decision, identity.user_id, notes, Utc::now())
            .await?;
        if !updated {
            return Err(AppError::Conflict(
                "Leave request has already been reviewed".to_string(),
            ));
        }

        let request = self
            .store
            .get_leave(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

        self.audit
            .record(
                AuditEntry::new(
                    AuditAction::UpdateStatusLeaveRequest,
                    EntityType::LeaveRequest,
                )
                .actor(Actor::User(identity.user_id))
                .entity(request.id)
                .description(format!("Leave request {}", request.status.as_str()))
                .metadata(serde_json::json!({ "status": request.status.as_str() }))
                .client(client),
            )
            .await;
        self.notifier.notify_leave_decision(&request).await;

        tracing::info!(
            request_id = %request.id,
            reviewer = %identity.user_id,
            status = request.status.as_str(),
            "Leave request reviewed"
        );
        Ok(request)
    }

    /// Delete a pending request. Allowed for the requester and for
    /// holders of `manage_users`.
    pub async fn delete(&self, identity: &Identity, client: &ClientInfo, id: Uuid) -> Result<()> {
        let existing = self
            .store
            .get_leave(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

        if existing.requester_id != identity.user_id
            && !identity.has_permission(Permission::ManageUsers)
        {
            self.record_deny(
                identity,
                client,
                id,
                "leave deletion requires ownership or manage_users",
            )
            .await;
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }
        if existing.status.is_terminal() {
            return Err(AppError::Conflict(
                "Only pending leave requests can be deleted".to_string(),
            ));
        }

        let deleted = self.store.delete_leave_if_pending(id).await?;
        if !deleted {
            return Err(AppError::Conflict(
                "Only pending leave requests can be deleted".to_string(),
            ));
        }

        self.audit
            .record(
                AuditEntry::new(AuditAction::DeleteLeaveRequest, EntityType::LeaveRequest)
                    .actor(Actor::User(identity.user_id))
                    .entity(id)
                    .description("Leave request deleted")
                    .client(client),
            )
            .await;
        Ok(())
    }

    /// Role-scoped listing: reviewers see every request, everyone else
    /// only their own.
    pub async fn list_for(&self, identity: &Identity) -> Result<Vec<LeaveRequest>> {
        if identity.has_permission(Permission::ApproveApplication) {
            self.store.list_leave().await
        } else {
            self.store.list_leave_by_requester(identity.user_id).await
        }
    }

    /// Fetch one request, subject to the same read scope as `list_for`.
    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<LeaveRequest> {
        let request = self
            .store
            .get_leave(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;
        if request.requester_id != identity.user_id
            && !identity.has_permission(Permission::ApproveApplication)
        {
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }
        Ok(request)
    }

    /// Counts by status and type over all requests.
    pub async fn stats(&self) -> Result<LeaveStats> {
        let requests = self.store.list_leave().await?;
        let mut by_type: HashMap<String, u64> = HashMap::new();
        let mut pending = 0;
        let mut approved = 0;
        let mut rejected = 0;
        for request in &requests {
            *by_type
                .entry(request.leave_type.as_str().to_string())
                .or_default() += 1;
            match request.status {
                RequestStatus::Pending => pending += 1,
                RequestStatus::Approved => approved += 1,
                RequestStatus::Rejected => rejected += 1,
            }
        }
        Ok(LeaveStats {
            total: requests.len(),
            pending,
            approved,
            rejected,
            by_type,
        })
    }
}
