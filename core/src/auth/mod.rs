use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError>;
    async fn sign_out(&self, session: &AuthSession) -> Result<(), RemoteError>;
}

/// The session shared between the auth flow and the store adapters.
///
/// Stores read the access token per request; the row visibility it grants is
/// enforced by the backend, not here.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<AuthSession>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, session: AuthSession) {
        *self.inner.write().await = Some(session);
    }

    pub async fn clear(&self) -> Option<AuthSession> {
        self.inner.write().await.take()
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.inner.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}
