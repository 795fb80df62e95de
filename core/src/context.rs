use crate::auth::{AuthProvider, SessionHandle};
use crate::collection::TaskCollection;
use crate::config::AppConfig;
use crate::error::CliError;
use crate::notify::NotificationHub;
use crate::store::TaskStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn TaskStore>,
    pub auth: Arc<dyn AuthProvider>,
    /// Shared with `store`; whatever is set here is what requests carry.
    pub session: SessionHandle,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    notifications: NotificationHub,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            notifications: NotificationHub::new(),
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    pub async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(CliError::Config(
                "services_factory missing (cannot build store/auth)".into(),
            ));
        };
        factory.build_services(cfg).await
    }

    /// A fresh, signed-out collection over `services.store` that reports
    /// through this context's notification hub. Signing it in installs the
    /// session the store reads.
    pub fn collection(&self, services: &Services) -> TaskCollection {
        TaskCollection::new(
            services.store.clone(),
            Arc::new(self.notifications.clone()),
            services.session.clone(),
        )
    }
}
