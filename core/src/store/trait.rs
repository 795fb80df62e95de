use async_trait::async_trait;

use crate::error::RemoteError;
use crate::task::{Task, TaskFormData, TaskOrder, TaskPatch, TaskStatus};

/// Boundary between the task entity and the backend `tasks` table.
///
/// Row visibility is scoped to the session user by the backend's access
/// policy; implementations never filter by user themselves.
#[async_trait]
pub trait TaskStore: Send + Sync {
    fn name(&self) -> &str;

    async fn list_tasks(&self, order: TaskOrder) -> Result<Vec<Task>, RemoteError>;

    /// Inserts a new row with `status = pending` and returns it as stored.
    async fn create_task(&self, form: &TaskFormData, user_id: &str) -> Result<Task, RemoteError>;

    /// Sends only the fields present in `patch`.
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError>;

    /// Fails with a not-found `RemoteError` when no row matched `id`.
    async fn delete_task(&self, id: &str) -> Result<(), RemoteError>;

    /// Flips `current` and writes it back. Not idempotent: two calls cancel out.
    async fn toggle_status(&self, id: &str, current: TaskStatus) -> Result<TaskStatus, RemoteError> {
        let next = current.toggled();
        self.update_task(id, &TaskPatch::status(next)).await?;
        Ok(next)
    }
}
