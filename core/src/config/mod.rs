mod load;
mod types;

pub use load::{apply_env_overrides, load_from};
pub use types::{
    AppConfig, AuthConfig, BackendConfig, BackendProvider, HttpBackendConfig, LoggingConfig,
    MemoryBackendConfig, ViewConfig,
};
