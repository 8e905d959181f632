//! Task and exam assignment model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Assignment kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Task,
    Exam,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::Task => "task",
            AssignmentKind::Exam => "exam",
        }
    }
}

/// A task or exam duty assigned to a user within a course.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub kind: AssignmentKind,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        user_id: Uuid,
        course_id: Uuid,
        kind: AssignmentKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            kind,
            title: title.into(),
            due_date: None,
            created_at: Utc::now(),
        }
    }
}
