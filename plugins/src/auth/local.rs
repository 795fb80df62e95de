use async_trait::async_trait;
use taskboard_core::api::{AuthProvider, AuthSession, AuthUser, RemoteError, RemoteErrorKind};

/// Accepts any well-formed email with a non-empty password. Pairs with the
/// in-memory store; the user id is stable per email so tasks survive a
/// sign-out/sign-in within one process.
#[derive(Debug, Default, Clone)]
pub struct LocalAuthProvider;

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let email = email.trim();
        if !email.contains('@') || password.is_empty() {
            return Err(
                RemoteError::new(RemoteErrorKind::Status, "Invalid login credentials")
                    .with_status(400),
            );
        }
        Ok(AuthSession {
            user: AuthUser {
                id: format!("local-{}", email.to_lowercase()),
                email: email.to_string(),
            },
            access_token: uuid::Uuid::new_v4().to_string(),
        })
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), RemoteError> {
        Ok(())
    }
}
