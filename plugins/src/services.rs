//! `ServicesFactory` wiring the configured store and auth provider around one shared session.
use async_trait::async_trait;
use taskboard_core::api::{AppConfig, CliError, Services, ServicesFactory, SessionHandle};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let session = SessionHandle::new();
        let store = factory::build_store(cfg, session.clone()).map_err(CliError::Anyhow)?;
        let auth = factory::build_auth(cfg).map_err(CliError::Anyhow)?;
        tracing::debug!(
            target: "taskboard.services",
            provider = cfg.backend.provider.kind(),
            store = store.name(),
            auth = auth.name()
        );
        Ok(Services {
            store,
            auth,
            session,
        })
    }
}
