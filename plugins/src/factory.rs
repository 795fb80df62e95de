use std::sync::Arc;

use anyhow::Result;

use taskboard_core::api::{AppConfig, AuthProvider, BackendProvider, SessionHandle, TaskStore};

use crate::auth::{HttpAuthProvider, LocalAuthProvider};
use crate::store::{HttpTaskStore, InMemoryTaskStore};

pub fn build_store(cfg: &AppConfig, session: SessionHandle) -> Result<Arc<dyn TaskStore>> {
    match &cfg.backend.provider {
        BackendProvider::Http(http_cfg) => {
            if http_cfg.anon_key.trim().is_empty() {
                tracing::warn!(
                    target: "taskboard.store",
                    base_url = %http_cfg.base_url,
                    "backend.anon_key is empty; requests will likely be rejected"
                );
            }
            Ok(Arc::new(HttpTaskStore::new(http_cfg, session)?))
        }
        BackendProvider::Memory(mem_cfg) => Ok(Arc::new(
            InMemoryTaskStore::new(session).with_demo_seed(mem_cfg.seed_demo),
        )),
    }
}

pub fn build_auth(cfg: &AppConfig) -> Result<Arc<dyn AuthProvider>> {
    match &cfg.backend.provider {
        BackendProvider::Http(http_cfg) => Ok(Arc::new(HttpAuthProvider::new(http_cfg)?)),
        BackendProvider::Memory(_) => Ok(Arc::new(LocalAuthProvider::new())),
    }
}
