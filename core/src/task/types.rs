use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// The only transition a status supports.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(TaskFieldError::Status(other.to_string())),
        }
    }
}

/// Priority values are stored capitalised, exactly as the table column holds them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Display order used by charts and the calendar legend.
    pub const DESCENDING: [TaskPriority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = TaskFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TaskFieldError::Priority(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFieldError {
    #[error("unknown task status: {0:?}")]
    Status(String),
    #[error("unknown task priority: {0:?} (expected Low, Medium or High)")]
    Priority(String),
    #[error("invalid due date: {0:?} (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
    DueDate(String),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("status can only be changed by toggling the task")]
    StatusNotEditable,
}

/// Normalises a user-entered due date into a full UTC timestamp.
///
/// A bare calendar date is taken as midnight UTC, the same instant a browser
/// date input produces.
pub fn normalize_due_date(input: &str) -> Result<DateTime<Utc>, TaskFieldError> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| TaskFieldError::DueDate(input.to_string()))
}

/// A task as the rest of the application sees it.
///
/// Serialized field names follow the entity model (`dueDate`, `userId`);
/// the backend row schema lives with the store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub user_id: String,
}

impl Task {
    pub fn due_day(&self) -> NaiveDate {
        self.due_date.date_naive()
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Overwrites the fields present in `patch`; `id` and `user_id` are never touched.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
    }
}

/// The editable subset of a task, as captured by the create/edit form.
///
/// `due_date` is kept as entered; the store adapter normalises it on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFormData {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: TaskPriority,
    pub user_id: String,
}

impl TaskFormData {
    pub fn validate(&self) -> Result<DateTime<Utc>, TaskFieldError> {
        if self.title.trim().is_empty() {
            return Err(TaskFieldError::EmptyTitle);
        }
        normalize_due_date(&self.due_date)
    }
}

/// Sparse update: `None` fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Full overwrite of the editable fields from a submitted form.
    pub fn from_form(form: &TaskFormData) -> Result<Self, TaskFieldError> {
        let due_date = form.validate()?;
        Ok(Self {
            title: Some(form.title.clone()),
            description: Some(form.description.clone()),
            status: None,
            due_date: Some(due_date),
            priority: Some(form.priority),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
    }

    /// Checks an edit. Status is not an editable field; only the toggle
    /// path writes it.
    pub fn validate(&self) -> Result<(), TaskFieldError> {
        if self.status.is_some() {
            return Err(TaskFieldError::StatusNotEditable);
        }
        match &self.title {
            Some(title) if title.trim().is_empty() => Err(TaskFieldError::EmptyTitle),
            _ => Ok(()),
        }
    }
}

/// Server-side ordering requested by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    /// Creation time, newest first.
    #[default]
    CreatedDesc,
    /// Due date, earliest first.
    DueDateAsc,
}

impl TaskOrder {
    /// PostgREST `order=` parameter value.
    pub fn as_query(self) -> &'static str {
        match self {
            Self::CreatedDesc => "created_at.desc",
            Self::DueDateAsc => "due_date.asc",
        }
    }
}

impl FromStr for TaskOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "created" | "created_desc" => Ok(Self::CreatedDesc),
            "due" | "due_date" | "due_date_asc" => Ok(Self::DueDateAsc),
            other => Err(format!("unknown task order: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        Task {
            id: "t1".to_string(),
            title: "Write report".to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            due_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            priority: TaskPriority::High,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn test_status_toggle_is_an_involution() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Pending.toggled().toggled(), TaskStatus::Pending);
    }

    #[test]
    fn test_normalize_plain_date_is_midnight_utc() {
        let ts = normalize_due_date("2024-06-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_normalize_rfc3339_converts_offset() {
        let ts = normalize_due_date("2024-06-01T10:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(
            normalize_due_date("next tuesday"),
            Err(TaskFieldError::DueDate(_))
        ));
    }

    #[test]
    fn test_form_requires_title() {
        let form = TaskFormData {
            title: "   ".to_string(),
            description: String::new(),
            due_date: "2024-06-01".to_string(),
            priority: TaskPriority::Low,
            user_id: "u1".to_string(),
        };
        assert_eq!(form.validate(), Err(TaskFieldError::EmptyTitle));
    }

    #[test]
    fn test_patch_cannot_carry_status() {
        assert_eq!(
            TaskPatch::status(TaskStatus::Completed).validate(),
            Err(TaskFieldError::StatusNotEditable)
        );
        let form = TaskFormData {
            title: "Write report".to_string(),
            description: String::new(),
            due_date: "2024-06-01".to_string(),
            priority: TaskPriority::Low,
            user_id: "u1".to_string(),
        };
        assert_eq!(TaskPatch::from_form(&form).unwrap().validate(), Ok(()));
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut task = sample();
        task.apply(&TaskPatch {
            title: Some("Ship report".to_string()),
            ..TaskPatch::default()
        });
        assert_eq!(task.title, "Ship report");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.id, "t1");
    }

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!("high".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert_eq!("Low".parse::<TaskPriority>().unwrap(), TaskPriority::Low);
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_entity_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["dueDate"], "2024-06-01T00:00:00Z");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["priority"], "High");
    }

    #[test]
    fn test_order_query_values() {
        assert_eq!(TaskOrder::CreatedDesc.as_query(), "created_at.desc");
        assert_eq!(TaskOrder::DueDateAsc.as_query(), "due_date.asc");
        assert_eq!("due".parse::<TaskOrder>().unwrap(), TaskOrder::DueDateAsc);
    }
}
