//! A signed-in collection plus the services behind it.

use taskboard_core::api::{
    AppContext, AuthUser, CliError, CollectionError, Notification, Notifier, Services,
    TaskCollection,
};
use tokio::sync::broadcast;

pub const PASSWORD_ENV: &str = "TASKBOARD_PASSWORD";

pub struct Board {
    ctx: AppContext,
    services: Services,
    collection: TaskCollection,
    user: AuthUser,
}

impl Board {
    /// Signs in and loads the user's tasks. A failed fetch is already
    /// reported as a notification and leaves an empty, usable board.
    pub async fn open(ctx: &AppContext, email: Option<String>) -> Result<Self, CliError> {
        let email = email
            .or_else(|| ctx.cfg().auth.email.clone())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "no account configured: pass --email, set auth.email or TASKBOARD_EMAIL"
                        .to_string(),
                )
            })?;
        let password = std::env::var(PASSWORD_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CliError::Config(format!("{PASSWORD_ENV} is not set")))?;

        let services = ctx.build_services(ctx.cfg()).await?;
        let session = services
            .auth
            .sign_in(&email, &password)
            .await
            .map_err(CliError::Auth)?;
        let user = session.user.clone();
        tracing::info!(
            target: "taskboard.cli",
            user_id = %user.id,
            store = services.store.name(),
            "signed in"
        );

        let collection = ctx.collection(&services);
        match collection.sign_in(session).await {
            Ok(_) | Err(CollectionError::Remote(_)) => {}
            Err(err) => return Err(err.into()),
        }

        Ok(Self {
            ctx: ctx.clone(),
            services,
            collection,
            user,
        })
    }

    pub fn collection(&self) -> &TaskCollection {
        &self.collection
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub async fn close(self) -> Result<(), CliError> {
        if let Some(session) = self.collection.sign_out().await? {
            if let Err(err) = self.services.auth.sign_out(&session).await {
                tracing::warn!(target: "taskboard.cli", error = %err, "remote sign-out failed");
            }
        }
        self.ctx.notifications().notify(Notification::info(
            "Signed out",
            "You have been signed out successfully.",
        ));
        Ok(())
    }
}

/// Prints notifications raised since the last drain to stderr.
pub struct Toasts {
    rx: broadcast::Receiver<Notification>,
}

impl Toasts {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            rx: ctx.notifications().subscribe(),
        }
    }

    pub fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(n) => eprintln!("{}", crate::render::toast(&n)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "taskboard.cli", skipped, "notifications dropped");
                }
                Err(_) => break,
            }
        }
    }
}
