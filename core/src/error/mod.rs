#[allow(clippy::module_inception)]
pub mod error;
pub mod remote;

pub use error::{CliError, CollectionError};
pub use remote::{RemoteError, RemoteErrorKind};
