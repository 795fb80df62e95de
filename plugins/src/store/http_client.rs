use async_trait::async_trait;
use reqwest::RequestBuilder;
use taskboard_core::api::{
    HttpBackendConfig, RemoteError, RemoteErrorKind, SessionHandle, Task, TaskFormData, TaskOrder,
    TaskPatch, TaskStatus, TaskStore,
};

use super::rows::{DeletedRow, NewTaskRow, TaskPatchRow, TaskRow};
use crate::http::{ensure_success, from_reqwest, read_json};

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MINIMAL: &str = "return=minimal";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// `TaskStore` over a PostgREST table (`<base_url>/rest/v1/<table>`).
///
/// Every request carries the project `apikey`; the bearer is the signed-in
/// user's access token when there is one, otherwise the anon key.
pub struct HttpTaskStore {
    http: reqwest::Client,
    anon_key: String,
    session: SessionHandle,
    url_tasks: String,
}

impl HttpTaskStore {
    pub fn new(cfg: &HttpBackendConfig, session: SessionHandle) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            anon_key: cfg.anon_key.clone(),
            session,
            url_tasks: format!("{}/rest/v1/{}", normalized, cfg.table),
        })
    }

    async fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = if self.anon_key.trim().is_empty() {
            req
        } else {
            req.header("apikey", &self.anon_key)
        };
        match self.session.access_token().await {
            Some(token) => req.bearer_auth(token),
            None if !self.anon_key.trim().is_empty() => req.bearer_auth(&self.anon_key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        self.authorize(req)
            .await
            .send()
            .await
            .map_err(|err| from_reqwest(err, &self.url_tasks))
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_tasks(&self, order: TaskOrder) -> Result<Vec<Task>, RemoteError> {
        let url = &self.url_tasks;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.list.in",
            url = %url,
            order = order.as_query()
        );
        let req = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", order.as_query())]);
        let resp = self.send(req).await?;
        let status = resp.status();
        let rows: Vec<TaskRow> = read_json(resp).await?;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.list.out",
            status = %status,
            rows = rows.len()
        );
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn create_task(&self, form: &TaskFormData, user_id: &str) -> Result<Task, RemoteError> {
        let url = &self.url_tasks;
        let due_date = form
            .validate()
            .map_err(|err| RemoteError::new(RemoteErrorKind::Request, err.to_string()))?;
        let row = NewTaskRow {
            user_id,
            title: &form.title,
            description: &form.description,
            status: TaskStatus::Pending,
            due_date,
            priority: form.priority,
        };
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.create.in",
            url = %url,
            title_len = form.title.len(),
            priority = form.priority.as_str()
        );
        let req = self
            .http
            .post(url)
            .query(&[("select", "*")])
            .header("Prefer", PREFER_REPRESENTATION)
            .header("Accept", SINGLE_OBJECT)
            .json(&row);
        let resp = self.send(req).await?;
        let status = resp.status();
        let created: TaskRow = read_json(resp).await?;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.create.out",
            status = %status,
            id = %created.id
        );
        Ok(created.into())
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
        if patch.is_empty() {
            tracing::debug!(
                target: "taskboard.store",
                stage = "store.http.update.skip",
                id = %id
            );
            return Ok(());
        }
        let url = &self.url_tasks;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.update.in",
            url = %url,
            id = %id,
            status_change = patch.status.is_some()
        );
        let filter = format!("eq.{id}");
        let req = self
            .http
            .patch(url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", PREFER_MINIMAL)
            .json(&TaskPatchRow::from(patch));
        let resp = self.send(req).await?;
        let status = resp.status();
        ensure_success(resp).await?;
        tracing::debug!(target: "taskboard.store", stage = "store.http.update.out", status = %status);
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), RemoteError> {
        let url = &self.url_tasks;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.delete.in",
            url = %url,
            id = %id
        );
        let filter = format!("eq.{id}");
        let req = self
            .http
            .delete(url)
            .query(&[("id", filter.as_str()), ("select", "id")])
            .header("Prefer", PREFER_REPRESENTATION);
        let resp = self.send(req).await?;
        let status = resp.status();
        let deleted: Vec<DeletedRow> = read_json(resp).await?;
        tracing::debug!(
            target: "taskboard.store",
            stage = "store.http.delete.out",
            status = %status,
            rows = deleted.len()
        );
        if deleted.is_empty() {
            return Err(RemoteError::not_found(format!("no task with id {id}")).with_url(url));
        }
        Ok(())
    }
}
