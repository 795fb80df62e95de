use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::task::TaskOrder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `log_dir()`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "taskboard_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. Unset or blank means `~/.taskboard/logs`.
    #[serde(default)]
    pub directory: Option<String>,

    /// Log files are named `<file_prefix>.<pid>.log`.
    #[serde(default = "default_logging_file_prefix")]
    pub file_prefix: String,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

fn default_logging_file_prefix() -> String {
    "taskboard".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
            file_prefix: default_logging_file_prefix(),
        }
    }
}

impl LoggingConfig {
    /// Where log files go: `directory` when set, else the data dir's `logs/`,
    /// else the OS temp dir when there is no home directory.
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = self.directory.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        match super::load::get_taskboard_data_dir() {
            Ok(data_dir) => data_dir.join("logs"),
            Err(_) => std::env::temp_dir().join("taskboard"),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}.log", self.file_prefix, std::process::id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(flatten)]
    pub provider: BackendProvider,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::Http(HttpBackendConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum BackendProvider {
    /// Hosted REST table plus auth endpoint.
    #[serde(rename = "http")]
    Http(HttpBackendConfig),
    /// Process-local store, gone on exit.
    #[serde(rename = "memory")]
    Memory(MemoryBackendConfig),
}

impl BackendProvider {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Memory(_) => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Public (anon) project key, sent as `apikey` on every request.
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_table() -> String {
    "tasks".to_string()
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            anon_key: String::new(),
            timeout_ms: default_timeout_ms(),
            table: default_table(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBackendConfig {
    /// Seed a handful of example tasks on first sign-in.
    #[serde(default)]
    pub seed_demo: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Ordering for `list`; the collection itself is always newest first.
    #[serde(default)]
    pub default_order: TaskOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.backend.provider.kind(), "http");
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.file_prefix, "taskboard");
        assert_eq!(cfg.view.default_order, TaskOrder::CreatedDesc);
    }

    #[test]
    fn test_logging_location_comes_from_config() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [logging]
            file = true
            directory = "/var/log/board"
            file_prefix = "board-cli"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.logging.log_dir(), PathBuf::from("/var/log/board"));
        let name = cfg.logging.file_name();
        assert!(name.starts_with("board-cli."));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_blank_log_directory_falls_back() {
        let logging = LoggingConfig {
            directory: Some("  ".to_string()),
            ..LoggingConfig::default()
        };
        let dir = logging.log_dir();
        assert!(dir.ends_with("logs") || dir.ends_with("taskboard"));
        assert_ne!(dir, PathBuf::from("  "));
    }

    #[test]
    fn test_http_backend_section() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [backend]
            provider = "http"
            base_url = "https://abc.supabase.co"
            anon_key = "public-key"

            [view]
            default_order = "due_date_asc"
            "#,
        )
        .unwrap();

        let BackendProvider::Http(http) = &cfg.backend.provider else {
            panic!("expected http provider");
        };
        assert_eq!(http.base_url, "https://abc.supabase.co");
        assert_eq!(http.anon_key, "public-key");
        assert_eq!(http.timeout_ms, 10_000);
        assert_eq!(http.table, "tasks");
        assert_eq!(cfg.view.default_order, TaskOrder::DueDateAsc);
    }

    #[test]
    fn test_memory_backend_section() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [backend]
            provider = "memory"
            seed_demo = true
            "#,
        )
        .unwrap();
        assert!(matches!(
            cfg.backend.provider,
            BackendProvider::Memory(MemoryBackendConfig { seed_demo: true })
        ));
    }
}
