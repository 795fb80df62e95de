use thiserror::Error;

use super::remote::RemoteError;
use crate::collection::{CollectionPhase, PhaseTransitionError};
use crate::task::TaskFieldError;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("no authenticated user")]
    NotSignedIn,
    #[error("collection is not ready (phase: {0:?})")]
    NotReady(CollectionPhase),
    #[error("task not found in collection: {0}")]
    UnknownTask(String),
    #[error("invalid task: {0}")]
    Validation(#[from] TaskFieldError),
    #[error(transparent)]
    Transition(#[from] PhaseTransitionError),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("identity changed while the request was in flight")]
    Superseded,
    #[error("session belongs to {session:?}, collection is bound to {bound}")]
    SessionMismatch {
        bound: String,
        session: Option<String>,
    },
}

impl CollectionError {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(#[source] RemoteError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("{0}")]
    Collection(#[from] CollectionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
