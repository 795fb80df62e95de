//! The authoritative client-side copy of the signed-in user's tasks.
//!
//! Mutations go to the store first and patch local state only once the store
//! reports success. The state lock is never held across a store call, so
//! concurrent mutations of one task settle in whatever order their requests
//! resolve.
//!
//! The collection owns the binding between its user and the `SessionHandle`
//! the store reads: `sign_in` installs the session, `sign_out` clears it, and
//! every load or mutation first checks that the handle still belongs to the
//! bound user.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::transitions::{PhaseTransition, PhaseTransitionError};
use super::types::{CollectionPhase, CollectionSnapshot, ItemSync};
use crate::auth::{AuthSession, AuthUser, SessionHandle};
use crate::error::CollectionError;
use crate::notify::{Notification, Notifier};
use crate::store::TaskStore;
use crate::task::{Task, TaskFormData, TaskOrder, TaskPatch, TaskStatus};

#[derive(Clone)]
pub struct TaskCollection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    session: SessionHandle,
    state: RwLock<CollectionState>,
}

struct CollectionState {
    phase: CollectionPhase,
    user: Option<AuthUser>,
    tasks: Vec<Task>,
    sync: HashMap<String, ItemSync>,
    /// Bumped on every identity change; results from an older epoch are dropped.
    epoch: u64,
    /// Bumped on every fetch; only the latest fetch may settle `Loading`.
    load_ticket: u64,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            phase: CollectionPhase::Uninitialized,
            user: None,
            tasks: Vec::new(),
            sync: HashMap::new(),
            epoch: 0,
            load_ticket: 0,
        }
    }

    fn transition(&mut self, to: CollectionPhase) -> Result<(), PhaseTransitionError> {
        PhaseTransition::validate(self.phase, to)?;
        self.phase = to;
        Ok(())
    }

    fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    fn mark_failed(&mut self, id: &str, message: &str) {
        if self.contains(id) {
            self.sync
                .insert(id.to_string(), ItemSync::Failed(message.to_string()));
        } else {
            self.sync.remove(id);
        }
    }
}

impl TaskCollection {
    /// `session` must be the handle `store` authenticates with.
    pub fn new(
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn Notifier>,
        session: SessionHandle,
    ) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                store,
                notifier,
                session,
                state: RwLock::new(CollectionState::new()),
            }),
        }
    }

    /// Binds the collection to `user` and fetches their tasks.
    ///
    /// Signing in as the user already bound keeps the cached tasks. A fetch
    /// failure still leaves the collection `Ready` (and empty); the error is
    /// both notified and returned.
    #[tracing::instrument(name = "collection.sign_in", skip(self, session), fields(user_id = %session.user.id))]
    pub async fn sign_in(&self, session: AuthSession) -> Result<usize, CollectionError> {
        let user = session.user.clone();
        let user_id = user.id.clone();
        self.inner.session.set(session).await;
        let (epoch, ticket) = {
            let mut state = self.inner.state.write().await;
            let same_user = state.user.as_ref().is_some_and(|u| u.id == user.id);
            if same_user && state.phase == CollectionPhase::Ready {
                return Ok(state.tasks.len());
            }
            state.transition(CollectionPhase::Loading)?;
            if !same_user {
                state.epoch += 1;
                state.user = Some(user);
            }
            state.tasks.clear();
            state.sync.clear();
            state.load_ticket += 1;
            (state.epoch, state.load_ticket)
        };
        self.load(epoch, ticket, &user_id).await
    }

    /// Refetches the current user's tasks.
    pub async fn refresh(&self) -> Result<usize, CollectionError> {
        let (epoch, ticket, user_id) = {
            let mut state = self.inner.state.write().await;
            let Some(user_id) = state.user.as_ref().map(|u| u.id.clone()) else {
                return Err(CollectionError::NotSignedIn);
            };
            state.transition(CollectionPhase::Loading)?;
            state.load_ticket += 1;
            (state.epoch, state.load_ticket, user_id)
        };
        self.load(epoch, ticket, &user_id).await
    }

    /// Drops the user, every cached task and the shared session. Mutations
    /// issue no requests until the next `sign_in`.
    ///
    /// Returns the session that was installed, for remote revocation.
    pub async fn sign_out(&self) -> Result<Option<AuthSession>, CollectionError> {
        {
            let mut state = self.inner.state.write().await;
            state.transition(CollectionPhase::Uninitialized)?;
            state.user = None;
            state.tasks.clear();
            state.sync.clear();
            state.epoch += 1;
            tracing::debug!(
                target: "taskboard.collection",
                stage = "collection.sign_out",
                epoch = state.epoch
            );
        }
        Ok(self.inner.session.clear().await)
    }

    async fn load(&self, epoch: u64, ticket: u64, user_id: &str) -> Result<usize, CollectionError> {
        tracing::debug!(
            target: "taskboard.collection",
            stage = "collection.load.in",
            store = self.inner.store.name(),
            ticket = ticket
        );
        let result = match self.session_mismatch(user_id).await {
            Some(err) => Err(err),
            None => self
                .inner
                .store
                .list_tasks(TaskOrder::CreatedDesc)
                .await
                .map_err(CollectionError::from),
        };

        let mut state = self.inner.state.write().await;
        if state.epoch != epoch || state.load_ticket != ticket {
            tracing::debug!(
                target: "taskboard.collection",
                stage = "collection.load.superseded",
                ticket = ticket
            );
            return Err(CollectionError::Superseded);
        }
        state.transition(CollectionPhase::Ready)?;
        state.sync.clear();

        match result {
            Ok(tasks) => {
                let count = tasks.len();
                state.tasks = tasks;
                tracing::debug!(
                    target: "taskboard.collection",
                    stage = "collection.load.out",
                    count = count
                );
                Ok(count)
            }
            Err(err) => {
                state.tasks.clear();
                drop(state);
                tracing::warn!(target: "taskboard.collection", error = %err, "loading tasks failed");
                let description = match err.remote() {
                    Some(remote) => remote.message().to_string(),
                    None => err.to_string(),
                };
                self.notify(Notification::error("Error loading tasks", description));
                Err(err)
            }
        }
    }

    /// Creates a task owned by the signed-in user and prepends it.
    ///
    /// Ownership always comes from the bound user, whatever `form.user_id` says.
    pub async fn add(&self, form: TaskFormData) -> Result<Task, CollectionError> {
        let (user, epoch) = self.guard().await?;
        if let Err(err) = form.validate() {
            self.notify(Notification::error("Error creating task", err.to_string()));
            return Err(err.into());
        }

        match self.inner.store.create_task(&form, &user.id).await {
            Ok(task) => {
                {
                    let mut state = self.inner.state.write().await;
                    if state.epoch != epoch {
                        return Err(CollectionError::Superseded);
                    }
                    state.tasks.insert(0, task.clone());
                }
                tracing::info!(target: "taskboard.collection", task_id = %task.id, "task created");
                self.notify(Notification::info(
                    "Task created",
                    "Your new task has been created successfully.",
                ));
                Ok(task)
            }
            Err(err) => {
                self.notify(Notification::error("Error creating task", err.message()));
                Err(err.into())
            }
        }
    }

    /// Applies a sparse update. The local entry is patched to the intended
    /// values once the store accepts the write.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), CollectionError> {
        let (_, epoch) = self.guard().await?;
        if let Err(err) = patch.validate() {
            self.notify(Notification::error("Error updating task", err.to_string()));
            return Err(err.into());
        }

        self.mark_pending(id, epoch).await;
        match self.inner.store.update_task(id, &patch).await {
            Ok(()) => {
                {
                    let mut state = self.inner.state.write().await;
                    if state.epoch != epoch {
                        return Err(CollectionError::Superseded);
                    }
                    if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
                        task.apply(&patch);
                    }
                    state.sync.remove(id);
                }
                self.notify(Notification::info(
                    "Task updated",
                    "Your task has been updated successfully.",
                ));
                Ok(())
            }
            Err(err) => {
                self.settle_failed(id, epoch, err.message()).await;
                self.notify(Notification::error("Error updating task", err.message()));
                Err(err.into())
            }
        }
    }

    /// Removes a task remotely, then prunes it locally.
    pub async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        let (_, epoch) = self.guard().await?;

        self.mark_pending(id, epoch).await;
        match self.inner.store.delete_task(id).await {
            Ok(()) => {
                {
                    let mut state = self.inner.state.write().await;
                    if state.epoch != epoch {
                        return Err(CollectionError::Superseded);
                    }
                    state.tasks.retain(|t| t.id != id);
                    state.sync.remove(id);
                }
                self.notify(Notification::info("Task deleted", "The task has been removed."));
                Ok(())
            }
            Err(err) => {
                self.settle_failed(id, epoch, err.message()).await;
                self.notify(Notification::error("Error deleting task", err.message()));
                Err(err.into())
            }
        }
    }

    /// Flips pending/completed based on the locally known status.
    ///
    /// Unknown ids are rejected without a request.
    pub async fn toggle(&self, id: &str) -> Result<TaskStatus, CollectionError> {
        let (_, epoch) = self.guard().await?;
        let current = {
            let state = self.inner.state.read().await;
            state
                .tasks
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.status)
                .ok_or_else(|| CollectionError::UnknownTask(id.to_string()))?
        };

        self.mark_pending(id, epoch).await;
        match self.inner.store.toggle_status(id, current).await {
            Ok(next) => {
                let mut state = self.inner.state.write().await;
                if state.epoch != epoch {
                    return Err(CollectionError::Superseded);
                }
                if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
                    task.status = next;
                }
                state.sync.remove(id);
                Ok(next)
            }
            Err(err) => {
                self.settle_failed(id, epoch, err.message()).await;
                self.notify(Notification::error("Error updating task", err.message()));
                Err(err.into())
            }
        }
    }

    pub async fn phase(&self) -> CollectionPhase {
        self.inner.state.read().await.phase
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.inner.state.read().await.user.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.state.read().await.tasks.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        let state = self.inner.state.read().await;
        state.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub async fn sync_of(&self, id: &str) -> ItemSync {
        let state = self.inner.state.read().await;
        state.sync.get(id).cloned().unwrap_or(ItemSync::Settled)
    }

    pub async fn snapshot(&self) -> CollectionSnapshot {
        let state = self.inner.state.read().await;
        CollectionSnapshot {
            phase: state.phase,
            user: state.user.clone(),
            tasks: state.tasks.clone(),
            sync: state.sync.clone(),
        }
    }

    async fn guard(&self) -> Result<(AuthUser, u64), CollectionError> {
        let state = self.inner.state.read().await;
        let Some(user) = state.user.clone() else {
            return Err(CollectionError::NotSignedIn);
        };
        if !PhaseTransition::accepts_mutations(state.phase) {
            return Err(CollectionError::NotReady(state.phase));
        }
        let epoch = state.epoch;
        drop(state);
        if let Some(err) = self.session_mismatch(&user.id).await {
            return Err(err);
        }
        Ok((user, epoch))
    }

    /// `Some` when the shared handle no longer carries `user_id`'s session.
    async fn session_mismatch(&self, user_id: &str) -> Option<CollectionError> {
        let session_user = self.inner.session.user().await.map(|u| u.id);
        if session_user.as_deref() == Some(user_id) {
            return None;
        }
        tracing::warn!(
            target: "taskboard.collection",
            bound = %user_id,
            session = ?session_user,
            "session handle does not belong to the bound user"
        );
        Some(CollectionError::SessionMismatch {
            bound: user_id.to_string(),
            session: session_user,
        })
    }

    async fn mark_pending(&self, id: &str, epoch: u64) {
        let mut state = self.inner.state.write().await;
        if state.epoch == epoch && state.contains(id) {
            state.sync.insert(id.to_string(), ItemSync::Pending);
        }
    }

    async fn settle_failed(&self, id: &str, epoch: u64, message: &str) {
        let mut state = self.inner.state.write().await;
        if state.epoch == epoch {
            state.mark_failed(id, message);
        }
    }

    fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, RemoteErrorKind};
    use crate::task::TaskPriority;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedStore {
        rows: Mutex<Vec<Task>>,
        next_id: AtomicUsize,
        fail: AtomicBool,
        lists: AtomicUsize,
        creates: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        create_entered: Option<Arc<Notify>>,
        create_gate: Option<Arc<Notify>>,
        update_entered: Option<Arc<Notify>>,
        update_gate: Option<Arc<Notify>>,
        hold_lists: AtomicBool,
        list_entered: Option<Arc<Notify>>,
        list_gate: Option<Arc<Notify>>,
    }

    impl ScriptedStore {
        fn with_rows(rows: Vec<Task>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Self::default()
            }
        }

        fn requests(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
                + self.creates.load(Ordering::SeqCst)
                + self.updates.load(Ordering::SeqCst)
                + self.deletes.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<(), RemoteError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(RemoteError::new(RemoteErrorKind::Status, "backend unavailable").with_status(503))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskStore for ScriptedStore {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn list_tasks(&self, _order: TaskOrder) -> Result<Vec<Task>, RemoteError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            let result = self.check().map(|()| self.rows.lock().unwrap().clone());
            if self.hold_lists.swap(false, Ordering::SeqCst) {
                if let Some(entered) = &self.list_entered {
                    entered.notify_one();
                }
                if let Some(gate) = &self.list_gate {
                    gate.notified().await;
                }
            }
            result
        }

        async fn create_task(
            &self,
            form: &TaskFormData,
            user_id: &str,
        ) -> Result<Task, RemoteError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if let Some(entered) = &self.create_entered {
                entered.notify_one();
            }
            if let Some(gate) = &self.create_gate {
                gate.notified().await;
            }
            self.check()?;
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let task = Task {
                id: format!("task-{n}"),
                title: form.title.clone(),
                description: form.description.clone(),
                status: TaskStatus::Pending,
                due_date: crate::task::normalize_due_date(&form.due_date).unwrap(),
                priority: form.priority,
                user_id: user_id.to_string(),
            };
            self.rows.lock().unwrap().insert(0, task.clone());
            Ok(task)
        }

        async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if let Some(entered) = &self.update_entered {
                entered.notify_one();
            }
            if let Some(gate) = &self.update_gate {
                gate.notified().await;
            }
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|t| t.id == id) {
                row.apply(patch);
            }
            Ok(())
        }

        async fn delete_task(&self, id: &str) -> Result<(), RemoteError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|t| t.id != id);
            if rows.len() == before {
                return Err(RemoteError::not_found(format!("task {id} not found")));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn titles(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.title.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    fn session(id: &str) -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: id.to_string(),
                email: format!("{id}@example.com"),
            },
            access_token: format!("token-{id}"),
        }
    }

    fn task(id: &str, owner: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            status,
            due_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            priority: TaskPriority::Medium,
            user_id: owner.to_string(),
        }
    }

    fn milk_form() -> TaskFormData {
        TaskFormData {
            title: "Buy milk".to_string(),
            description: "2%".to_string(),
            due_date: "2024-06-01".to_string(),
            priority: TaskPriority::Low,
            user_id: "u1".to_string(),
        }
    }

    fn setup(store: ScriptedStore) -> (TaskCollection, Arc<ScriptedStore>, Arc<RecordingNotifier>) {
        setup_with_session(store, SessionHandle::new())
    }

    fn setup_with_session(
        store: ScriptedStore,
        handle: SessionHandle,
    ) -> (TaskCollection, Arc<ScriptedStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let collection = TaskCollection::new(store.clone(), notifier.clone(), handle);
        (collection, store, notifier)
    }

    #[tokio::test]
    async fn test_sign_in_loads_tasks() {
        let (collection, store, _) = setup(ScriptedStore::with_rows(vec![
            task("a", "u1", TaskStatus::Pending),
            task("b", "u1", TaskStatus::Completed),
        ]));
        assert_eq!(collection.phase().await, CollectionPhase::Uninitialized);

        let count = collection.sign_in(session("u1")).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(collection.phase().await, CollectionPhase::Ready);
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);

        // same identity keeps the cache
        collection.sign_in(session("u1")).await.unwrap();
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_ready_and_empty() {
        let (collection, store, notifier) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        store.fail.store(true, Ordering::SeqCst);

        let err = collection.sign_in(session("u1")).await.unwrap_err();

        assert!(err.remote().is_some());
        assert_eq!(collection.phase().await, CollectionPhase::Ready);
        assert!(collection.tasks().await.is_empty());
        assert_eq!(notifier.titles(), vec!["Error loading tasks".to_string()]);
    }

    #[tokio::test]
    async fn test_add_prepends_pending_task() {
        let (collection, _, notifier) = setup(ScriptedStore::with_rows(vec![task(
            "old",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();

        let created = collection.add(milk_form()).await.unwrap();

        assert_eq!(created.status, TaskStatus::Pending);
        assert!(!created.id.is_empty());
        assert_eq!(created.user_id, "u1");
        let tasks = collection.tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, created.id);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(notifier.titles(), vec!["Task created".to_string()]);
    }

    #[tokio::test]
    async fn test_add_uses_bound_user_not_form_owner() {
        let (collection, _, _) = setup(ScriptedStore::default());
        collection.sign_in(session("u2")).await.unwrap();

        let created = collection.add(milk_form()).await.unwrap();

        assert_eq!(created.user_id, "u2");
    }

    #[tokio::test]
    async fn test_add_rejects_blank_title_without_request() {
        let (collection, store, notifier) = setup(ScriptedStore::default());
        collection.sign_in(session("u1")).await.unwrap();
        let before = store.requests();

        let mut form = milk_form();
        form.title = "  ".to_string();
        let err = collection.add(form).await.unwrap_err();

        assert!(matches!(err, CollectionError::Validation(_)));
        assert_eq!(store.requests(), before);
        assert_eq!(notifier.titles(), vec!["Error creating task".to_string()]);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_status_with_two_requests() {
        let (collection, store, _) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();

        assert_eq!(collection.toggle("a").await.unwrap(), TaskStatus::Completed);
        assert_eq!(collection.toggle("a").await.unwrap(), TaskStatus::Pending);

        assert_eq!(store.updates.load(Ordering::SeqCst), 2);
        assert_eq!(collection.get("a").await.unwrap().status, TaskStatus::Pending);
        assert_eq!(collection.sync_of("a").await, ItemSync::Settled);
    }

    #[tokio::test]
    async fn test_toggle_unknown_task_issues_no_request() {
        let (collection, store, _) = setup(ScriptedStore::default());
        collection.sign_in(session("u1")).await.unwrap();

        let err = collection.toggle("missing").await.unwrap_err();

        assert!(matches!(err, CollectionError::UnknownTask(_)));
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_task_leaves_collection_unchanged() {
        let (collection, _, notifier) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();
        let before = collection.tasks().await;

        let err = collection.delete("ghost").await.unwrap_err();

        assert_eq!(err.remote().map(|e| e.kind()), Some(RemoteErrorKind::NotFound));
        assert_eq!(collection.tasks().await, before);
        assert_eq!(collection.sync_of("ghost").await, ItemSync::Settled);
        assert_eq!(notifier.titles(), vec!["Error deleting task".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_prunes_task() {
        let (collection, _, _) = setup(ScriptedStore::with_rows(vec![
            task("a", "u1", TaskStatus::Pending),
            task("b", "u1", TaskStatus::Pending),
        ]));
        collection.sign_in(session("u1")).await.unwrap();

        collection.delete("a").await.unwrap();

        let ids: Vec<String> = collection.tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_update_marks_item_and_keeps_state() {
        let (collection, store, notifier) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();
        store.fail.store(true, Ordering::SeqCst);

        let patch = TaskPatch {
            title: Some("renamed".to_string()),
            ..TaskPatch::default()
        };
        assert!(collection.update("a", patch).await.is_err());

        assert_eq!(collection.get("a").await.unwrap().title, "task a");
        assert_eq!(
            collection.sync_of("a").await,
            ItemSync::Failed("backend unavailable".to_string())
        );
        assert_eq!(notifier.titles(), vec!["Error updating task".to_string()]);
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let (collection, _, _) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();

        let patch = TaskPatch {
            priority: Some(TaskPriority::High),
            ..TaskPatch::default()
        };
        collection.update("a", patch).await.unwrap();

        let updated = collection.get("a").await.unwrap();
        assert_eq!(updated.priority, TaskPriority::High);
        assert_eq!(updated.title, "task a");
    }

    #[tokio::test]
    async fn test_sign_out_clears_and_blocks_mutations() {
        let (collection, store, _) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();

        collection.sign_out().await.unwrap();
        let before = store.requests();

        assert!(collection.tasks().await.is_empty());
        assert_eq!(collection.phase().await, CollectionPhase::Uninitialized);
        assert!(matches!(
            collection.add(milk_form()).await,
            Err(CollectionError::NotSignedIn)
        ));
        assert!(matches!(
            collection.delete("a").await,
            Err(CollectionError::NotSignedIn)
        ));
        assert!(matches!(
            collection.toggle("a").await,
            Err(CollectionError::NotSignedIn)
        ));
        assert_eq!(store.requests(), before);
    }

    #[tokio::test]
    async fn test_switching_user_refetches() {
        let (collection, store, _) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();
        collection.sign_out().await.unwrap();
        collection.sign_in(session("u2")).await.unwrap();

        assert_eq!(store.lists.load(Ordering::SeqCst), 2);
        assert_eq!(collection.user().await.map(|u| u.id), Some("u2".to_string()));
    }

    #[tokio::test]
    async fn test_result_from_previous_identity_is_dropped() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let store = ScriptedStore {
            create_entered: Some(entered.clone()),
            create_gate: Some(gate.clone()),
            ..ScriptedStore::default()
        };
        let (collection, _, _) = setup(store);
        collection.sign_in(session("u1")).await.unwrap();

        let pending = {
            let collection = collection.clone();
            tokio::spawn(async move { collection.add(milk_form()).await })
        };
        entered.notified().await;
        collection.sign_out().await.unwrap();
        gate.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(CollectionError::Superseded)));
        assert!(collection.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_summary_invariant_holds_after_mutations() {
        let (collection, _, _) = setup(ScriptedStore::with_rows(vec![
            task("a", "u1", TaskStatus::Pending),
            task("b", "u1", TaskStatus::Completed),
        ]));
        collection.sign_in(session("u1")).await.unwrap();
        collection.add(milk_form()).await.unwrap();
        collection.toggle("a").await.unwrap();

        let summary = crate::dashboard::Summary::from_tasks(&collection.tasks().await);
        assert_eq!(summary.total, summary.pending + summary.completed);
        assert_eq!(summary.total, 3);
    }

    #[tokio::test]
    async fn test_sign_in_replaces_stale_session() {
        let handle = SessionHandle::new();
        handle.set(session("ann")).await;
        let (collection, _, _) = setup_with_session(ScriptedStore::default(), handle.clone());

        collection.sign_in(session("bob")).await.unwrap();

        assert_eq!(handle.user().await.map(|u| u.id), Some("bob".to_string()));
        assert_eq!(handle.access_token().await.as_deref(), Some("token-bob"));
        assert_eq!(collection.user().await.map(|u| u.id), Some("bob".to_string()));
    }

    #[tokio::test]
    async fn test_sign_out_clears_shared_session() {
        let handle = SessionHandle::new();
        let (collection, _, _) = setup_with_session(ScriptedStore::default(), handle.clone());
        collection.sign_in(session("u1")).await.unwrap();

        let revoked = collection.sign_out().await.unwrap();

        assert_eq!(revoked.map(|s| s.user.id), Some("u1".to_string()));
        assert!(handle.user().await.is_none());
        assert!(handle.access_token().await.is_none());
    }

    #[tokio::test]
    async fn test_swapped_session_blocks_requests() {
        let handle = SessionHandle::new();
        let (collection, store, notifier) = setup_with_session(
            ScriptedStore::with_rows(vec![task("a", "bob", TaskStatus::Pending)]),
            handle.clone(),
        );
        collection.sign_in(session("bob")).await.unwrap();
        handle.set(session("ann")).await;
        let before = store.requests();

        let err = collection.add(milk_form()).await.unwrap_err();
        assert!(matches!(
            err,
            CollectionError::SessionMismatch { ref bound, ref session }
                if bound == "bob" && session.as_deref() == Some("ann")
        ));
        assert!(matches!(
            collection.toggle("a").await,
            Err(CollectionError::SessionMismatch { .. })
        ));
        assert!(matches!(
            collection.refresh().await,
            Err(CollectionError::SessionMismatch { .. })
        ));

        assert_eq!(store.requests(), before);
        assert_eq!(collection.phase().await, CollectionPhase::Ready);
        assert!(collection.tasks().await.is_empty());
        assert_eq!(notifier.titles(), vec!["Error loading tasks".to_string()]);
    }

    #[tokio::test]
    async fn test_update_rejects_status_change() {
        let (collection, store, notifier) = setup(ScriptedStore::with_rows(vec![task(
            "a",
            "u1",
            TaskStatus::Pending,
        )]));
        collection.sign_in(session("u1")).await.unwrap();

        let err = collection
            .update("a", TaskPatch::status(TaskStatus::Completed))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectionError::Validation(crate::task::TaskFieldError::StatusNotEditable)
        ));
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
        assert_eq!(collection.get("a").await.unwrap().status, TaskStatus::Pending);
        assert_eq!(notifier.titles(), vec!["Error updating task".to_string()]);
    }

    #[tokio::test]
    async fn test_item_is_pending_while_update_in_flight() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let store = ScriptedStore {
            rows: Mutex::new(vec![task("a", "u1", TaskStatus::Pending)]),
            update_entered: Some(entered.clone()),
            update_gate: Some(gate.clone()),
            ..ScriptedStore::default()
        };
        let (collection, _, _) = setup(store);
        collection.sign_in(session("u1")).await.unwrap();

        let pending = {
            let collection = collection.clone();
            tokio::spawn(async move {
                let patch = TaskPatch {
                    title: Some("renamed".to_string()),
                    ..TaskPatch::default()
                };
                collection.update("a", patch).await
            })
        };
        entered.notified().await;

        assert_eq!(collection.sync_of("a").await, ItemSync::Pending);
        assert_eq!(collection.snapshot().await.sync_of("a"), ItemSync::Pending);
        assert_eq!(collection.get("a").await.unwrap().title, "task a");

        gate.notify_one();
        pending.await.unwrap().unwrap();

        assert_eq!(collection.sync_of("a").await, ItemSync::Settled);
        assert_eq!(collection.get("a").await.unwrap().title, "renamed");
    }

    #[tokio::test]
    async fn test_older_refresh_is_superseded_by_newer() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let store = ScriptedStore {
            rows: Mutex::new(vec![task("old", "u1", TaskStatus::Pending)]),
            list_entered: Some(entered.clone()),
            list_gate: Some(gate.clone()),
            ..ScriptedStore::default()
        };
        let (collection, store, _) = setup(store);
        collection.sign_in(session("u1")).await.unwrap();

        store.hold_lists.store(true, Ordering::SeqCst);
        let older = {
            let collection = collection.clone();
            tokio::spawn(async move { collection.refresh().await })
        };
        entered.notified().await;

        *store.rows.lock().unwrap() = vec![
            task("new-1", "u1", TaskStatus::Pending),
            task("new-2", "u1", TaskStatus::Completed),
        ];
        assert_eq!(collection.refresh().await.unwrap(), 2);

        gate.notify_one();
        assert!(matches!(older.await.unwrap(), Err(CollectionError::Superseded)));

        let ids: Vec<String> = collection.tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["new-1".to_string(), "new-2".to_string()]);
        assert_eq!(collection.phase().await, CollectionPhase::Ready);
    }

    #[tokio::test]
    async fn test_failed_refresh_empties_loaded_collection() {
        let (collection, store, notifier) = setup(ScriptedStore::with_rows(vec![
            task("a", "u1", TaskStatus::Pending),
            task("b", "u1", TaskStatus::Completed),
        ]));
        collection.sign_in(session("u1")).await.unwrap();
        assert_eq!(collection.tasks().await.len(), 2);
        store.fail.store(true, Ordering::SeqCst);

        let err = collection.refresh().await.unwrap_err();

        assert!(err.remote().is_some());
        assert_eq!(collection.phase().await, CollectionPhase::Ready);
        assert!(collection.tasks().await.is_empty());
        assert_eq!(notifier.titles(), vec!["Error loading tasks".to_string()]);
    }
}
