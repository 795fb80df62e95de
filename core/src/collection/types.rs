use serde::Serialize;
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionPhase {
    /// No user, no tasks, no requests.
    Uninitialized,
    /// Initial fetch for the current user is outstanding.
    Loading,
    /// Accepting mutations.
    Ready,
}

/// Per-task outcome of the latest mutation, so a failed write can be shown
/// instead of leaving the optimistic value on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum ItemSync {
    Settled,
    Pending,
    Failed(String),
}

/// Point-in-time copy of the collection for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub phase: CollectionPhase,
    pub user: Option<AuthUser>,
    pub tasks: Vec<Task>,
    pub sync: HashMap<String, ItemSync>,
}

impl CollectionSnapshot {
    pub fn sync_of(&self, id: &str) -> ItemSync {
        self.sync.get(id).cloned().unwrap_or(ItemSync::Settled)
    }
}
