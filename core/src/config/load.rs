use anyhow::Context;
use std::path::{Path, PathBuf};

use super::types::{AppConfig, BackendProvider, HttpBackendConfig, MemoryBackendConfig};

/// Get the default taskboard data directory: ~/.taskboard
pub(crate) fn get_taskboard_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".taskboard"))
}

/// Loads config with the following precedence, highest first:
/// environment variables, `explicit`, `~/.taskboard/config.toml`,
/// `./config.toml`, built-in defaults.
pub fn load_from(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let home_config = get_taskboard_data_dir()
                .ok()
                .map(|dir| dir.join("config.toml"))
                .filter(|p| p.exists());
            let local_config = Path::new("config.toml");

            if let Some(path) = home_config {
                read_config(&path)?
            } else if local_config.exists() {
                read_config(local_config)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str::<AppConfig>(&s).with_context(|| format!("parse config {}", path.display()))
}

/// Applies `TASKBOARD_*` overrides. Blank values are ignored; an unknown
/// provider name is an error.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TASKBOARD_PROVIDER") {
        match v.trim() {
            "http" if !matches!(cfg.backend.provider, BackendProvider::Http(_)) => {
                cfg.backend.provider = BackendProvider::Http(HttpBackendConfig::default());
            }
            "memory" if !matches!(cfg.backend.provider, BackendProvider::Memory(_)) => {
                cfg.backend.provider = BackendProvider::Memory(MemoryBackendConfig::default());
            }
            "http" | "memory" => {}
            other => {
                anyhow::bail!("unknown TASKBOARD_PROVIDER {other:?} (expected http or memory)");
            }
        }
    }

    if let BackendProvider::Http(ref mut http) = cfg.backend.provider {
        if let Some(v) = get("TASKBOARD_URL") {
            http.base_url = v;
        }
        if let Some(v) = get("TASKBOARD_ANON_KEY") {
            http.anon_key = v;
        }
    }

    if let Some(v) = get("TASKBOARD_EMAIL") {
        cfg.auth.email = Some(v);
    }
    Ok(())
}
