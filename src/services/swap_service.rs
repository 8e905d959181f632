//! Swap request workflow and eligibility resolution.
//!
//! Same lifecycle shape as leave requests, plus the eligibility
//! computation for valid swap counterparts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    AssignmentKind, Permission, RequestStatus, ReviewDecision, SwapRequest, User,
};
use crate::services::audit_service::{
    Actor, AuditAction, AuditEntry, AuditService, ClientInfo, EntityType,
};
use crate::services::auth_service::Identity;
use crate::services::notification_service::NotificationService;
use crate::store::Store;

/// Policy: a holder of `approve_application` may decide any pending
/// swap, not only ones naming them as target.
pub const REVIEWER_DECIDES_ANY_SWAP: bool = true;

/// Validated creation payload
#[derive(Debug, Clone)]
pub struct CreateSwapRequest {
    pub target_id: Uuid,
    pub kind: AssignmentKind,
    pub assignment_id: Uuid,
    pub proposed_assignment_id: Option<Uuid>,
    pub reason: String,
}

/// Counts by status and assignment kind
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub by_kind: HashMap<String, u64>,
}

/// Swap request workflow service
pub struct SwapService {
    store: Arc<dyn Store>,
    audit: Arc<AuditService>,
    notifier: Arc<NotificationService>,
}

impl SwapService {
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

    /// Create a new swap request; status starts at `pending`.
    pub async fn create(
        &self,
        identity: &Identity,
        client: &ClientInfo,
        input: CreateSwapRequest,
    ) -> Result<SwapRequest> {
        if input.target_id == identity.user_id {
            return Err(AppError::Validation(
                "requester and target must differ".to_string(),
            ));
        }
        if input.reason.trim().is_empty() {
            return Err(AppError::Validation("reason must not be empty".to_string()));
        }

        let assignment = self
            .store
            .get_assignment(input.assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;
        if assignment.user_id != identity.user_id {
            return Err(AppError::Validation(
                "assignment does not belong to the requester".to_string(),
            ));
        }
        if assignment.kind != input.kind {
            return Err(AppError::Validation(
                "assignment kind does not match the request".to_string(),
            ));
        }

        let target = self
            .store
            .get_user(input.target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Target user not found".to_string()))?;

        if let Some(proposed_id) = input.proposed_assignment_id {
            let proposed = self
                .store
                .get_assignment(proposed_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Proposed assignment not found".to_string()))?;
            if proposed.user_id != input.target_id {
                return Err(AppError::Validation(
                    "proposed assignment does not belong to the target".to_string(),
                ));
            }
            if proposed.kind != input.kind || proposed.course_id != assignment.course_id {
                return Err(AppError::Validation(
                    "proposed assignment is not a resolvable counterpart".to_string(),
                ));
            }
        }

        let request = SwapRequest {
            id: Uuid::new_v4(),
            requester_id: identity.user_id,
            target_id: input.target_id,
            kind: input.kind,
            assignment_id: input.assignment_id,
            proposed_assignment_id: input.proposed_assignment_id,
            reason: input.reason,
            status: RequestStatus::Pending,
            reviewer_id: None,
            reviewer_notes: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        self.store.insert_swap(request.clone()).await?;

        self.audit
            .record(
                AuditEntry::new(AuditAction::CreateSwapRequest, EntityType::SwapRequest)
                    .actor(Actor::User(identity.user_id))
                    .entity(request.id)
                    .description("Swap request created")
                    .metadata(serde_json::json!({
                        "kind": request.kind.as_str(),
                        "target_id": request.target_id,
                        "assignment_id": request.assignment_id,
                    }))
                    .client(client),
            )
            .await;

        let requester_name = match self.store.get_user(identity.user_id).await {
            Ok(Some(user)) => user.username,
            _ => identity.user_id.to_string(),
        };
        self.notifier
            .notify_swap_request(&request, &requester_name)
            .await;

        tracing::info!(
            request_id = %request.id,
            requester = %identity.user_id,
            target = %target.id,
            "Swap request created"
        );
        Ok(request)
    }

    /// Apply a terminal decision to a pending swap. Allowed for holders
    /// of `approve_application` (blanket policy) and for the named
    /// target.
    pub async fn decide(
        &self,
        identity: &Identity,
        client: &ClientInfo,
        id: Uuid,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> Result<SwapRequest> {
        let existing = self
            .store
            .get_swap(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        let is_target = existing.target_id == identity.user_id;
        let is_reviewer =
            REVIEWER_DECIDES_ANY_SWAP && identity.has_permission(Permission::ApproveApplication);
        if !is_target && !is_reviewer {
            self.record_deny(
                identity,
                client,
                id,
                "swap decision requires being the target or approve_application",
            )
            .await;
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }

        if existing.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Swap request has already been {}",
                existing.status.as_str()
            )));
        }

        let updated = self
            .store
            .decide_swap(id, decision, identity.user_id, notes, Utc::now())
            .await?;
        if !updated {
            return Err(AppError::Conflict(
                "Swap request has already been reviewed".to_string(),
            ));
        }

        let request = self
            .store
            .get_swap(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        self.audit
            .record(
                AuditEntry::new(AuditAction::UpdateStatusSwapRequest, EntityType::SwapRequest)
                    .actor(Actor::User(identity.user_id))
                    .entity(request.id)
                    .description(format!("Swap request {}", request.status.as_str()))
                    .metadata(serde_json::json!({ "status": request.status.as_str() }))
                    .client(client),
            )
            .await;
        self.notifier.notify_swap_decision(&request).await;

        tracing::info!(
            request_id = %request.id,
            reviewer = %identity.user_id,
            status = request.status.as_str(),
            "Swap request reviewed"
        );
        Ok(request)
    }

    /// Delete a pending swap. Allowed for the requester and for holders
    /// of `manage_users`.
    pub async fn delete(&self, identity: &Identity, client: &ClientInfo, id: Uuid) -> Result<()> {
        let existing = self
            .store
            .get_swap(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;

        if existing.requester_id != identity.user_id
            && !identity.has_permission(Permission::ManageUsers)
        {
            self.record_deny(
                identity,
                client,
                id,
                "swap deletion requires ownership or manage_users",
            )
            .await;
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }
        if existing.status.is_terminal() {
            return Err(AppError::Conflict(
                "Only pending swap requests can be deleted".to_string(),
            ));
        }

        let deleted = self.store.delete_swap_if_pending(id).await?;
        if !deleted {
            return Err(AppError::Conflict(
                "Only pending swap requests can be deleted".to_string(),
            ));
        }

        self.audit
            .record(
                AuditEntry::new(AuditAction::DeleteSwapRequest, EntityType::SwapRequest)
                    .actor(Actor::User(identity.user_id))
                    .entity(id)
                    .description("Swap request deleted")
                    .client(client),
            )
            .await;
        Ok(())
    }

    /// Role-scoped listing, same scope rule as leave requests.
    pub async fn list_for(&self, identity: &Identity) -> Result<Vec<SwapRequest>> {
        if identity.has_permission(Permission::ApproveApplication) {
            self.store.list_swap().await
        } else {
            self.store.list_swap_by_requester(identity.user_id).await
        }
    }

    /// Fetch one swap, visible to requester, target and reviewers.
    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<SwapRequest> {
        let request = self
            .store
            .get_swap(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Swap request not found".to_string()))?;
        if request.requester_id != identity.user_id
            && request.target_id != identity.user_id
            && !identity.has_permission(Permission::ApproveApplication)
        {
            return Err(AppError::Authorization(
                "insufficient permissions".to_string(),
            ));
        }
        Ok(request)
    }

    /// Users who may legally be the counterpart of a swap: assigned to
    /// the same course with the same kind, not the requester, and not
    /// already party to a pending swap on the same assignment. Ordered
    /// by ascending id; empty when no candidate exists.
    pub async fn eligible_targets(
        &self,
        requester_id: Uuid,
        assignment_id: Uuid,
        kind: AssignmentKind,
    ) -> Result<Vec<User>> {
        let assignment = self
            .store
            .get_assignment(assignment_id)
            .await?
            .filter(|a| a.kind == kind)
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

        let mut excluded: HashSet<Uuid> = HashSet::new();
        excluded.insert(requester_id);
        for swap in self
            .store
            .pending_swaps_for_assignment(assignment_id)
            .await?
        {
            excluded.insert(swap.requester_id);
            excluded.insert(swap.target_id);
        }

        let peers = self
            .store
            .assignments_in_course(assignment.course_id, kind)
            .await?;
        let mut candidate_ids: Vec<Uuid> = peers
            .iter()
            .map(|a| a.user_id)
            .filter(|id| !excluded.contains(id))
            .collect();
        candidate_ids.sort();
        candidate_ids.dedup();

        let mut candidates = Vec::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            if let Some(user) = self.store.get_user(id).await? {
                if user.is_active {
                    candidates.push(user);
                }
            }
        }
        Ok(candidates)
    }

    /// Counts by status and kind over all swaps.
    pub async fn stats(&self) -> Result<SwapStats> {
        let requests = self.store.list_swap().await?;
        let mut by_kind: HashMap<String, u64> = HashMap::new();
        let mut pending = 0;
        let mut approved = 0;
        let mut rejected = 0;
        for request in &requests {
            *by_kind
                .entry(request.kind.as_str().to_string())
                .or_default() += 1;
            match request.status {
                RequestStatus::Pending => pending += 1,
                RequestStatus::Approved => approved += 1,
                RequestStatus::Rejected => rejected += 1,
            }
        }
        Ok(SwapStats {
            total: requests.len(),
            pending,
            approved,
            rejected,
            by_kind,
        })
    }
}
