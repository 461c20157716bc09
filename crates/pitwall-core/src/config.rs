use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_FILTER: &str = "pitwall_daemon=info,pitwall_scheduler=info";
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 256;

/// Top-level config (pitwall.toml + PITWALL_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitwallConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Outbound "race scheduled" / "race reminder" messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// When false the scheduler runs with a notifier that only logs.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Capacity of the notification queue. Messages beyond it are dropped.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer: DEFAULT_NOTIFICATION_BUFFER,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_buffer() -> usize {
    DEFAULT_NOTIFICATION_BUFFER
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pitwall/pitwall.db", home)
}

impl PitwallConfig {
    /// Load config from a TOML file with PITWALL_* env var overrides.
    ///
    /// Falls back to `~/.pitwall/pitwall.toml` when no path is given. A missing
    /// file is not an error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PITWALL_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pitwall/pitwall.toml", home)
}
