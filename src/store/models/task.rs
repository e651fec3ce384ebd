use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::double_option;
use super::user::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with the assignee's profile joined in, as served by the project
/// task listing.
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithAssignee {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<UserProfile>,
}

/// Task with its owning project's name, as served by `/my-tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedTask {
    #[serde(flatten)]
    pub task: Task,
    pub project: ProjectName,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectName {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub created_by: Uuid,
}

/// Whitelisted update payload. `assigned_to` and `due_date` accept an
/// explicit null to clear the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<String>,
}
