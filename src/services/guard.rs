//! Authorization guard.
//!
//! Decides allow/deny for an action given an identity. Two strategies
//! exist: the permission check (ANY-of over required permissions) and
//! the legacy role allow-list. Every decision writes exactly one audit
//! entry carrying the caller's connection details; audit failures never
//! change the decision.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Permission, Role};
use crate::services::audit_service::{
    Actor, AuditAction, AuditEntry, AuditService, ClientInfo, EntityType,
};
use crate::services::auth_service::Identity;

/// One step of a guard pipeline.
#[derive(Debug, Clone, Copy)]
pub enum GuardCheck {
    /// At least one of the listed permissions must be held.
    AnyPermission(&'static [Permission]),
    /// The caller's role must appear in the allow-list (legacy strategy).
    AnyRole(&'static [Role]),
}

/// Authorization guard
pub struct Guard {
    audit: Arc<AuditService>,
}

impl Guard {
    pub fn new(audit: Arc<AuditService>) -> Self {
        Self { audit }
    }

    /// Require at least one of `required` (ANY-of semantics).
    pub async fn require(
        &self,
        identity: Option<&Identity>,
        client: &ClientInfo,
        required: &[Permission],
    ) -> Result<()> {
        let outcome = match identity {
            None => Err(AppError::Authentication("Missing credentials".to_string())),
            Some(identity) => {
                if required.is_empty() || required.iter().any(|p| identity.has_permission(*p)) {
                    Ok(())
                } else {
                    Err(AppError::Authorization(
                        "insufficient permissions".to_string(),
                    ))
                }
            }
        };

        let description = format!(
            "required any of [{}]",
            required
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.record_decision(identity, client, &outcome, description)
            .await;
        outcome
    }

    /// Legacy strategy: the caller's role must be in the allow-list.
    pub async fn require_role(
        &self,
        identity: Option<&Identity>,
        client: &ClientInfo,
        allowed: &[Role],
    ) -> Result<()> {
        let outcome = match identity {
            None => Err(AppError::Authentication("Missing credentials".to_string())),
            Some(identity) => {
                if allowed.contains(&identity.role) {
                    Ok(())
                } else {
                    Err(AppError::Authorization(
                        "insufficient permissions".to_string(),
                    ))
                }
            }
        };

        let description = format!(
            "required role in [{}]",
            allowed
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.record_decision(identity, client, &outcome, description)
            .await;
        outcome
    }

    /// Evaluate an ordered pipeline of checks; the first rejection wins.
    pub async fn check_all(
        &self,
        identity: Option<&Identity>,
        client: &ClientInfo,
        checks: &[GuardCheck],
    ) -> Result<()> {
        for check in checks {
            match check {
                GuardCheck::AnyPermission(required) => {
                    self.require(identity, client, required).await?
                }
                GuardCheck::AnyRole(allowed) => self.require_role(identity, client, allowed).await?,
            }
        }
        Ok(())
    }

    async fn record_decision(
        &self,
        identity: Option<&Identity>,
        client: &ClientInfo,
        outcome: &Result<()>,
        description: String,
    ) {
        let action = match outcome {
            Ok(()) => AuditAction::AuthorizeAllow,
            Err(_) => AuditAction::AuthorizeDeny,
        };
        let actor = match identity {
            Some(identity) => Actor::User(identity.user_id),
            None => Actor::Anonymous,
        };
        let mut entry = AuditEntry::new(action, EntityType::Authorization)
            .actor(actor)
            .description(description)
            .client(client);
        if let Err(e) = outcome {
            entry = entry.metadata(serde_json::json!({ "reason": e.to_string() }));
        }
        self.audit.record(entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PermissionRegistry;
    use crate::store::{AuditFilter, AuditLogStore, MemoryStore};
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        let registry = PermissionRegistry::new();
        Identity {
            user_id: Uuid::new_v4(),
            role,
            permissions: registry.permissions_for(role).clone(),
        }
    }

    fn guard(store: Arc<MemoryStore>) -> Guard {
        Guard::new(Arc::new(AuditService::new(store)))
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("10.0.0.7".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    async fn audit_count(store: &MemoryStore, action: &str) -> usize {
        let filter = AuditFilter {
            action: Some(action.to_string()),
            ..Default::default()
        };
        store.query_audit(&filter, 0, usize::MAX).await.unwrap().1
    }

    #[tokio::test]
    async fn missing_identity_is_authentication_error() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());

        let err = guard
            .require(None, &client(), &[Permission::ViewUsers])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert_eq!(audit_count(&store, "authorize_deny").await, 1);
    }

    #[tokio::test]
    async fn any_of_semantics() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());
        let ta = identity(Role::TeachingAssistant);

        // TA holds request_leave but not view_users; ANY-of passes.
        guard
            .require(
                Some(&ta),
                &client(),
                &[Permission::ViewUsers, Permission::RequestLeave],
            )
            .await
            .unwrap();
        assert_eq!(audit_count(&store, "authorize_allow").await, 1);
    }

    #[tokio::test]
    async fn deny_writes_exactly_one_entry() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());
        let ta = identity(Role::TeachingAssistant);

        let err = guard
            .require(Some(&ta), &client(), &[Permission::ApproveApplication])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert_eq!(audit_count(&store, "authorize_deny").await, 1);
        assert_eq!(audit_count(&store, "authorize_allow").await, 0);
    }

    #[tokio::test]
    async fn decisions_carry_client_details() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());
        let ta = identity(Role::TeachingAssistant);

        guard
            .require(Some(&ta), &client(), &[Permission::RequestLeave])
            .await
            .unwrap();

        let (entries, _) = store
            .query_audit(&AuditFilter::default(), 0, 1)
            .await
            .unwrap();
        assert_eq!(entries[0].ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(entries[0].user_agent.as_deref(), Some("test-agent"));

        // absent details stay unset rather than defaulting
        guard
            .require(
                Some(&ta),
                &ClientInfo::default(),
                &[Permission::RequestLeave],
            )
            .await
            .unwrap();
        let (entries, _) = store
            .query_audit(&AuditFilter::default(), 0, 1)
            .await
            .unwrap();
        assert!(entries[0].ip_address.is_none());
    }

    #[tokio::test]
    async fn role_allow_list_strategy() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());

        let chair = identity(Role::DepartmentChair);
        guard
            .require_role(
                Some(&chair),
                &client(),
                &[Role::Admin, Role::DepartmentChair],
            )
            .await
            .unwrap();

        let ta = identity(Role::TeachingAssistant);
        let err = guard
            .require_role(Some(&ta), &client(), &[Role::Admin, Role::DepartmentChair])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn pipeline_stops_at_first_rejection() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard(store.clone());
        let ta = identity(Role::TeachingAssistant);

        let err = guard
            .check_all(
                Some(&ta),
                &client(),
                &[
                    GuardCheck::AnyPermission(&[Permission::RequestSwap]),
                    GuardCheck::AnyRole(&[Role::Admin]),
                    GuardCheck::AnyPermission(&[Permission::ViewAuditLogs]),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        // first check allowed, second denied, third never evaluated
        assert_eq!(audit_count(&store, "authorize_allow").await, 1);
        assert_eq!(audit_count(&store, "authorize_deny").await, 1);
    }
}
