//! Row shapes of the backend `tasks` table.
//!
//! This is the only place that knows the column names; everything above the
//! store works with `Task`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::api::{Task, TaskPatch, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            status: row.status,
            due_date: row.due_date,
            priority: row.priority,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewTaskRow<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
}

/// Sparse update body: absent fields are not serialized at all.
#[derive(Debug, Serialize)]
pub struct TaskPatchRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

impl<'a> From<&'a TaskPatch> for TaskPatchRow<'a> {
    fn from(patch: &'a TaskPatch) -> Self {
        Self {
            title: patch.title.as_deref(),
            description: patch.description.as_deref(),
            status: patch.status,
            due_date: patch.due_date,
            priority: patch.priority,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeletedRow {
    pub id: String,
}
