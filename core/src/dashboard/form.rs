//! Create/edit form state and its routing to the collection.

use chrono::NaiveDate;
use serde::Serialize;

use crate::collection::TaskCollection;
use crate::error::CollectionError;
use crate::task::{Task, TaskFieldError, TaskFormData, TaskPatch, TaskPriority};

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskForm {
    /// Id of the task being edited; `None` when creating.
    pub editing: Option<String>,
    pub data: TaskFormData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Create(TaskFormData),
    Update { id: String, patch: TaskPatch },
}

impl TaskForm {
    /// Empty text, Medium priority, due today.
    pub fn blank(user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            editing: None,
            data: TaskFormData {
                title: String::new(),
                description: String::new(),
                due_date: today.format(DATE_INPUT_FORMAT).to_string(),
                priority: TaskPriority::Medium,
                user_id: user_id.into(),
            },
        }
    }

    /// Pre-populated from `task`; the due date is cut back to its calendar day.
    pub fn from_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id.clone()),
            data: TaskFormData {
                title: task.title.clone(),
                description: task.description.clone(),
                due_date: task.due_day().format(DATE_INPUT_FORMAT).to_string(),
                priority: task.priority,
                user_id: task.user_id.clone(),
            },
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn submit(self) -> Result<FormSubmission, TaskFieldError> {
        match self.editing {
            Some(id) => Ok(FormSubmission::Update {
                patch: TaskPatch::from_form(&self.data)?,
                id,
            }),
            None => {
                self.data.validate()?;
                Ok(FormSubmission::Create(self.data))
            }
        }
    }
}

impl FormSubmission {
    /// Routes to `add` or `update`. Returns the created task on create.
    pub async fn dispatch(
        self,
        collection: &TaskCollection,
    ) -> Result<Option<Task>, CollectionError> {
        match self {
            Self::Create(data) => collection.add(data).await.map(Some),
            Self::Update { id, patch } => collection.update(&id, patch).await.map(|_| None),
        }
    }
}
