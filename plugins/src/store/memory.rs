//! Process-local `TaskStore` used by `provider = "memory"` and by tests.
//!
//! Rows are scoped to the session user the same way the hosted backend's
//! row-level policy scopes them: other users' rows are invisible and an
//! insert for someone else is refused.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskboard_core::api::{
    RemoteError, RemoteErrorKind, SessionHandle, Task, TaskFormData, TaskOrder, TaskPatch,
    TaskPriority, TaskStatus, TaskStore,
};
use tokio::sync::RwLock;

struct StoredRow {
    task: Task,
    created_seq: u64,
}

#[derive(Default)]
struct Table {
    rows: Vec<StoredRow>,
    next_seq: u64,
    seeded_users: Vec<String>,
}

#[derive(Clone)]
pub struct InMemoryTaskStore {
    session: SessionHandle,
    table: Arc<RwLock<Table>>,
    seed_demo: bool,
    requests: Arc<AtomicUsize>,
}

impl InMemoryTaskStore {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            table: Arc::new(RwLock::new(Table::default())),
            seed_demo: false,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_demo_seed(mut self, seed_demo: bool) -> Self {
        self.seed_demo = seed_demo;
        self
    }

    /// Number of store calls that reached the table.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn session_user(&self) -> Result<String, RemoteError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.session
            .user()
            .await
            .map(|u| u.id)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::Status, "JWT required").with_status(401))
    }
}

impl Table {
    fn insert(&mut self, task: Task) -> Task {
        self.next_seq += 1;
        self.rows.push(StoredRow {
            task: task.clone(),
            created_seq: self.next_seq,
        });
        task
    }

    fn seed(&mut self, user_id: &str) {
        if self.seeded_users.iter().any(|u| u == user_id) {
            return;
        }
        self.seeded_users.push(user_id.to_string());

        let today = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or_else(Utc::now);
        let demo = [
            ("Plan the week", "Block out focus time", 0, TaskPriority::High, TaskStatus::Pending),
            ("Pay rent", "", 2, TaskPriority::Medium, TaskStatus::Pending),
            ("Renew passport", "Photos first", 9, TaskPriority::Low, TaskStatus::Pending),
            ("Call the bank", "", -1, TaskPriority::Medium, TaskStatus::Completed),
        ];
        for (title, description, offset_days, priority, status) in demo {
            self.insert(Task {
                id: uuid::Uuid::new_v4().to_string(),
                title: title.to_string(),
                description: description.to_string(),
                status,
                due_date: today + Duration::days(offset_days),
                priority,
                user_id: user_id.to_string(),
            });
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_tasks(&self, order: TaskOrder) -> Result<Vec<Task>, RemoteError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let Some(user) = self.session.user().await else {
            return Ok(Vec::new());
        };

        let mut table = self.table.write().await;
        if self.seed_demo {
            table.seed(&user.id);
        }
        let mut rows: Vec<&StoredRow> = table
            .rows
            .iter()
            .filter(|row| row.task.user_id == user.id)
            .collect();
        match order {
            TaskOrder::CreatedDesc => rows.sort_by(|a, b| b.created_seq.cmp(&a.created_seq)),
            TaskOrder::DueDateAsc => rows.sort_by(|a, b| a.task.due_date.cmp(&b.task.due_date)),
        }
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.memory.list",
            rows = rows.len()
        );
        Ok(rows.into_iter().map(|row| row.task.clone()).collect())
    }

    async fn create_task(&self, form: &TaskFormData, user_id: &str) -> Result<Task, RemoteError> {
        let session_user = self.session_user().await?;
        if session_user != user_id {
            return Err(RemoteError::new(
                RemoteErrorKind::Status,
                "new row violates row-level security policy for table \"tasks\"",
            )
            .with_status(403));
        }
        let due_date = form
            .validate()
            .map_err(|err| RemoteError::new(RemoteErrorKind::Request, err.to_string()))?;

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: form.title.clone(),
            description: form.description.clone(),
            status: TaskStatus::Pending,
            due_date,
            priority: form.priority,
            user_id: user_id.to_string(),
        };
        let created = self.table.write().await.insert(task);
        tracing::debug!(target: "taskboard.store", stage = "store.memory.create", id = %created.id);
        Ok(created)
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
        let session_user = self.session_user().await?;
        let mut table = self.table.write().await;
        // Zero matched rows is still a success, as on the hosted table.
        if let Some(row) = table
            .rows
            .iter_mut()
            .find(|row| row.task.id == id && row.task.user_id == session_user)
        {
            row.task.apply(patch);
        }
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), RemoteError> {
        let session_user = self.session_user().await?;
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table
            .rows
            .retain(|row| !(row.task.id == id && row.task.user_id == session_user));
        if table.rows.len() == before {
            return Err(RemoteError::not_found(format!("no task with id {id}")));
        }
        Ok(())
    }
}
