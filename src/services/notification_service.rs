//! Notification dispatch service.
//!
//! Persists one notification per target recipient. Multi-recipient
//! sends are best-effort: partial delivery is acceptable and only the
//! delivered count is reported. The transition helpers derive their
//! message text deterministically from entity fields.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LeaveRequest, Notification, Role, SwapRequest};
use crate::store::Store;

/// Notification type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskAssigned,
    LeaveStatus,
    SwapRequest,
    SwapStatus,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::LeaveStatus => "leave_status",
            NotificationKind::SwapRequest => "swap_request",
            NotificationKind::SwapStatus => "swap_status",
        }
    }
}

/// Uppercase the first ASCII letter: "approved" -> "Approved".
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Deterministic due-date phrasing from a day delta.
pub fn due_phrase(days: i64) -> String {
    match days {
        d if d > 1 => format!("due in {} days", d),
        1 => "due in 1 day".to_string(),
        0 => "due today".to_string(),
        -1 => "overdue by 1 day".to_string(),
        d => format!("overdue by {} days", -d),
    }
}

/// Notification dispatcher
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist a single notification for one recipient.
    pub async fn send_to_user(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        link: Option<String>,
        payload: Option<serde_json::Value>,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id,
            kind: kind.as_str().to_string(),
            title: title.into(),
            message: message.into(),
            link,
            payload,
            read: false,
            created_at: Utc::now(),
        };
        self.store.insert_notification(notification.clone()).await?;
        Ok(notification)
    }

    /// Best-effort fan-out; returns how many recipients were notified.
    pub async fn send_to_users(
        &self,
        recipients: &[Uuid],
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> usize {
        let mut delivered = 0;
        for &recipient in recipients {
            match self
                .send_to_user(recipient, kind, title, message, None, None)
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::warn!(recipient = %recipient, error = %e, "Notification delivery failed");
                }
            }
        }
        delivered
    }

    /// Notify every active user holding a role; returns delivered count.
    pub async fn send_to_role(
        &self,
        role: Role,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<usize> {
        let users = self.store.users_by_role(role).await?;
        let recipients: Vec<Uuid> = users
            .into_iter()
            .filter(|u| u.is_active)
            .map(|u| u.id)
            .collect();
        Ok(self.send_to_users(&recipients, kind, title, message).await)
    }

    /// Task-assignment notice with the days-remaining phrasing.
    pub async fn notify_task_assignment(
        &self,
        assignee: Uuid,
        title: &str,
        days_until_due: Option<i64>,
    ) {
        let message = match days_until_due {
            Some(days) => format!("You have been assigned: {} ({})", title, due_phrase(days)),
            None => format!("You have been assigned: {}", title),
        };
        self.deliver(
            assignee,
            NotificationKind::TaskAssigned,
            "New Task Assignment".to_string(),
            message,
            None,
        )
        .await;
    }

    /// Decision notice for a leave request, sent to the requester.
    pub async fn notify_leave_decision(&self, request: &LeaveRequest) {
        let status = request.status.as_str();
        let title = format!("Leave Request {}", capitalize(status));
        let message = format!(
            "Your leave request from {} to {} has been {}.",
            request.start_date, request.end_date, status
        );
        let payload = serde_json::json!({
            "request_id": request.id,
            "status": status,
        });
        self.deliver(
            request.requester_id,
            NotificationKind::LeaveStatus,
            title,
            message,
            Some(payload),
        )
        .await;
    }

    /// New-swap notice for the proposed target.
    pub async fn notify_swap_request(&self, request: &SwapRequest, requester_name: &str) {
        let message = format!(
            "{} has requested to swap a {} assignment with you.",
            requester_name,
            request.kind.as_str()
        );
        let payload = serde_json::json!({
            "request_id": request.id,
            "assignment_id": request.assignment_id,
        });
        self.deliver(
            request.target_id,
            NotificationKind::SwapRequest,
            "Swap Request Received".to_string(),
            message,
            Some(payload),
        )
        .await;
    }

    /// Decision notice for a swap request. Sent to the requester and,
    /// unless they are the reviewer, the counterpart.
    pub async fn notify_swap_decision(&self, request: &SwapRequest) {
        let status = request.status.as_str();
        let title = format!("Swap Request {}", capitalize(status));
        let message = format!(
            "Your {} swap request has been {}.",
            request.kind.as_str(),
            status
        );
        let payload = serde_json::json!({
            "request_id": request.id,
            "status": status,
        });

        self.deliver(
            request.requester_id,
            NotificationKind::SwapStatus,
            title.clone(),
            message.clone(),
            Some(payload.clone()),
        )
        .await;

        if request.reviewer_id != Some(request.target_id) {
            let counterpart_message = format!(
                "A {} swap request naming you has been {}.",
                request.kind.as_str(),
                status
            );
            self.deliver(
                request.target_id,
                NotificationKind::SwapStatus,
                title,
                counterpart_message,
                Some(payload),
            )
            .await;
        }
    }

    /// Persist one notice, logging (not propagating) delivery failures.
    async fn deliver(
        &self,
        recipient: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
        payload: Option<serde_json::Value>,
    ) {
        if let Err(e) = self
            .send_to_user(recipient, kind, title, message, None, payload)
            .await
        {
            tracing::warn!(recipient = %recipient, error = %e, "Notification delivery failed");
        }
    }
}
