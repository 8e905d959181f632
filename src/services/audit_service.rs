//! Audit logging service.
//!
//! Records every authorization decision and every mutating workflow
//! action. Appends are fire-and-forget: storage failures are logged to
//! the tracing channel and never surface to the primary operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::models::AuditLogEntry;
use crate::store::{AuditFilter, Store};

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    // Authentication
    Login,
    LoginFailed,

    // Authorization guard decisions
    AuthorizeAllow,
    AuthorizeDeny,

    // Leave request workflow
    CreateLeaveRequest,
    UpdateStatusLeaveRequest,
    DeleteLeaveRequest,

    // Swap request workflow
    CreateSwapRequest,
    UpdateStatusSwapRequest,
    DeleteSwapRequest,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::AuthorizeAllow => "authorize_allow",
            AuditAction::AuthorizeDeny => "authorize_deny",
            AuditAction::CreateLeaveRequest => "create_leave_request",
            AuditAction::UpdateStatusLeaveRequest => "update_status_leave_request",
            AuditAction::DeleteLeaveRequest => "delete_leave_request",
            AuditAction::CreateSwapRequest => "create_swap_request",
            AuditAction::UpdateStatusSwapRequest => "update_status_swap_request",
            AuditAction::DeleteSwapRequest => "delete_swap_request",
        }
    }
}

/// Entity types for audit logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    LeaveRequest,
    SwapRequest,
    Authorization,
    Notification,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::LeaveRequest => "leave_request",
            EntityType::SwapRequest => "swap_request",
            EntityType::Authorization => "authorization",
            EntityType::Notification => "notification",
        }
    }
}

/// Client connection details captured at the HTTP boundary and carried
/// into every audit entry the request produces.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Acting party recorded on an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(Uuid),
    Anonymous,
    System,
}

impl Actor {
    pub fn label(&self) -> String {
        match self {
            Actor::User(id) => id.to_string(),
            Actor::Anonymous => "anonymous".to_string(),
            Actor::System => "system".to_string(),
        }
    }
}

/// Audit log entry builder
pub struct AuditEntry {
    actor: Actor,
    action: AuditAction,
    entity_type: EntityType,
    entity_id: Option<Uuid>,
    description: String,
    metadata: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, entity_type: EntityType) -> Self {
        Self {
            actor: Actor::Anonymous,
            action,
            entity_type,
            entity_id: None,
            description: String::new(),
            metadata: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    pub fn entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn client(mut self, client: &ClientInfo) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self
    }

    fn build(self) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            actor: self.actor.label(),
            action: self.action.as_str().to_string(),
            entity_type: self.entity_type.as_str().to_string(),
            entity_id: self.entity_id,
            description: self.description,
            metadata: self.metadata,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate audit statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditStats {
    pub total: usize,
    pub by_action: HashMap<String, u64>,
    pub by_entity_type: HashMap<String, u64>,
    /// Counts keyed by ISO date (YYYY-MM-DD)
    pub by_day: BTreeMap<String, u64>,
}

/// Audit service
pub struct AuditService {
    store: Arc<dyn Store>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append an audit entry. Never fails: storage errors are logged
    /// and swallowed so they cannot mask the primary operation.
    pub async fn record(&self, entry: AuditEntry) {
        let entry = entry.build();
        if let Err(e) = self.store.append_audit(entry).await {
            tracing::warn!(error = %e, "Failed to append audit entry");
        }
    }

    /// Newest-first page of entries matching the filter, with total count.
    pub async fn query(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AuditLogEntry>, usize)> {
        self.store.query_audit(filter, offset, limit).await
    }

    /// History for a single entity, newest first.
    pub async fn entity_history(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>> {
        let filter = AuditFilter {
            entity_type: Some(entity_type.as_str().to_string()),
            entity_id: Some(entity_id),
            ..Default::default()
        };
        let (entries, _) = self.store.query_audit(&filter, 0, limit).await?;
        Ok(entries)
    }

    /// Aggregate counts by action, entity type and day.
    pub async fn stats(&self) -> Result<AuditStats> {
        let (entries, total) = self
            .store
            .query_audit(&AuditFilter::default(), 0, usize::MAX)
            .await?;

        let mut by_action: HashMap<String, u64> = HashMap::new();
        let mut by_entity_type: HashMap<String, u64> = HashMap::new();
        let mut by_day: BTreeMap<String, u64> = BTreeMap::new();
        for entry in &entries {
            *by_action.entry(entry.action.clone()).or_default() += 1;
            *by_entity_type.entry(entry.entity_type.clone()).or_default() += 1;
            *by_day
                .entry(entry.created_at.date_naive().to_string())
                .or_default() += 1;
        }

        Ok(AuditStats {
            total,
            by_action,
            by_entity_type,
            by_day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_audit_action_as_str() {
        assert_eq!(AuditAction::Login.as_str(), "login");
        assert_eq!(AuditAction::LoginFailed.as_str(), "login_failed");
        assert_eq!(AuditAction::AuthorizeAllow.as_str(), "authorize_allow");
        assert_eq!(AuditAction::AuthorizeDeny.as_str(), "authorize_deny");
        assert_eq!(
            AuditAction::CreateLeaveRequest.as_str(),
            "create_leave_request"
        );
        assert_eq!(
            AuditAction::UpdateStatusLeaveRequest.as_str(),
            "update_status_leave_request"
        );
        assert_eq!(
            AuditAction::DeleteLeaveRequest.as_str(),
            "delete_leave_request"
        );
        assert_eq!(
            AuditAction::CreateSwapRequest.as_str(),
            "create_swap_request"
        );
        assert_eq!(
            AuditAction::UpdateStatusSwapRequest.as_str(),
            "update_status_swap_request"
        );
        assert_eq!(
            AuditAction::DeleteSwapRequest.as_str(),
            "delete_swap_request"
        );
    }

    #[test]
    fn test_entity_type_as_str() {
        assert_eq!(EntityType::User.as_str(), "user");
        assert_eq!(EntityType::LeaveRequest.as_str(), "leave_request");
        assert_eq!(EntityType::SwapRequest.as_str(), "swap_request");
        assert_eq!(EntityType::Authorization.as_str(), "authorization");
        assert_eq!(EntityType::Notification.as_str(), "notification");
    }

    #[test]
    fn test_actor_labels() {
        let id = Uuid::new_v4();
        assert_eq!(Actor::User(id).label(), id.to_string());
        assert_eq!(Actor::Anonymous.label(), "anonymous");
        assert_eq!(Actor::System.label(), "system");
    }

    #[test]
    fn test_audit_entry_builder() {
        let user = Uuid::new_v4();
        let entity = Uuid::new_v4();
        let entry = AuditEntry::new(AuditAction::CreateLeaveRequest, EntityType::LeaveRequest)
            .actor(Actor::User(user))
            .entity(entity)
            .description("created")
            .metadata(serde_json::json!({"leave_type": "sick"}))
            .client(&ClientInfo {
                ip_address: Some("127.0.0.1".into()),
                user_agent: Some("test-agent".into()),
            })
            .build();

        assert_eq!(entry.actor, user.to_string());
        assert_eq!(entry.action, "create_leave_request");
        assert_eq!(entry.entity_type, "leave_request");
        assert_eq!(entry.entity_id, Some(entity));
        assert_eq!(entry.description, "created");
        assert_eq!(entry.ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(entry.user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn record_then_query_and_stats() {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditService::new(store);

        let entity = Uuid::new_v4();
        audit
            .record(
                AuditEntry::new(AuditAction::CreateSwapRequest, EntityType::SwapRequest)
                    .actor(Actor::System)
                    .entity(entity),
            )
            .await;
        audit
            .record(
                AuditEntry::new(AuditAction::UpdateStatusSwapRequest, EntityType::SwapRequest)
                    .actor(Actor::System)
                    .entity(entity),
            )
            .await;

        let history = audit
            .entity_history(EntityType::SwapRequest, entity, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        let stats = audit.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_action["create_swap_request"], 1);
        assert_eq!(stats.by_entity_type["swap_request"], 2);
        assert_eq!(stats.by_day.len(), 1);
    }
}
