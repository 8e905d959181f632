//! Notification model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Persisted per-user notification.
///
/// Created by the dispatcher; mutated only by the recipient (read flag,
/// deletion).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    /// Type tag, e.g. "leave_status", "swap_request"
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type() {
        let n = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            kind: "leave_status".into(),
            title: "Leave Request Approved".into(),
            message: "Your leave request has been approved.".into(),
            link: None,
            payload: None,
            read: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains(r#""type":"leave_status""#));
        assert!(!json.contains(r#""kind""#));
    }
}
