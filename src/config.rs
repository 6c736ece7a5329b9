use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Store config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Flat-file JSON path, or `sqlite://<path>` for the relational backend.
    #[serde(default = "default_store_url")]
    pub url: String,
}

fn default_store_url() -> String {
    "~/.remindbot/data/reminders.json".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Holiday calendar config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayConfig {
    /// Base URL of the holiday data source. Expected to expose
    /// `GET {base}/api/holiday/year/{year}`.
    #[serde(default = "default_holiday_api_base")]
    pub api_base: String,
}

fn default_holiday_api_base() -> String {
    "http://timor.tech".into()
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            api_base: default_holiday_api_base(),
        }
    }
}

// ---------------------------------------------------------------------------
// Log config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_dir() -> String {
    "~/.remindbot/logs".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub holiday: HolidayConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Per-user session isolation: reminders created in a group chat are keyed
    /// per creator instead of per room.
    #[serde(default)]
    pub unique_session: bool,
}

// ---------------------------------------------------------------------------
// Paths & loading
// ---------------------------------------------------------------------------

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".remindbot")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn data_dir() -> PathBuf {
    config_dir().join("data")
}

fn expand_home(raw: &str) -> PathBuf {
    if raw.starts_with('~') {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(raw.trim_start_matches("~/"))
    } else {
        PathBuf::from(raw)
    }
}

/// Store URL with `~` expanded, preserving a `sqlite://` scheme if present.
pub fn store_url(cfg: &Config) -> String {
    match cfg.store.url.strip_prefix("sqlite://") {
        Some(path) => format!("sqlite://{}", expand_home(path).display()),
        None => expand_home(&cfg.store.url).display().to_string(),
    }
}

pub fn log_dir_path(cfg: &Config) -> PathBuf {
    expand_home(&cfg.log.dir)
}

pub fn holiday_cache_path() -> PathBuf {
    data_dir().join("holiday_cache.json")
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = path.map(PathBuf::from).unwrap_or_else(config_path);

    if p.exists() {
        let text = std::fs::read_to_string(&p)
            .with_context(|| format!("reading config from {}", p.display()))?;
        let cfg: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config from {}", p.display()))?;
        Ok(cfg)
    } else {
        Ok(Config::default())
    }
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let p = path.map(PathBuf::from).unwrap_or_else(config_path);

    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(&p, json)?;
    Ok(())
}
