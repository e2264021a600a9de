//! Workspace configuration types for ScriptDesk.
//!
//! `WorkspaceConfig` represents the top-level `config.toml` that controls
//! retention, the recency window, storage backend, and the assistant backend.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest message TTL and recency window, in hours (ten years).
pub const MAX_WINDOW_HOURS: u64 = 24 * 365 * 10;

/// Longest period between retention sweeps, in minutes (one week).
pub const MAX_SWEEP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Top-level configuration.
///
/// Loaded from `~/.scriptdesk/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Scripts accessed within this many hours appear in the recent view.
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: u64,

    /// Seed the default scripts when no script list has been stored yet.
    #[serde(default = "default_true")]
    pub seed_default_scripts: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_recent_window_hours() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            retention: RetentionConfig::default(),
            recent_window_hours: default_recent_window_hours(),
            seed_default_scripts: true,
            storage: StorageConfig::default(),
            generator: GeneratorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// The recency window, capped at [`MAX_WINDOW_HOURS`].
    pub fn recent_window(&self) -> chrono::Duration {
        hours(self.recent_window_hours)
    }
}

/// Message retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum message age in hours.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Minutes between background retention sweeps.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_sweep_interval_minutes() -> u64 {
    60
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
        }
    }
}

impl RetentionConfig {
    /// The TTL, capped at [`MAX_WINDOW_HOURS`].
    pub fn ttl(&self) -> chrono::Duration {
        hours(self.ttl_hours)
    }

    /// The sweep period, capped at [`MAX_SWEEP_INTERVAL_MINUTES`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.min(MAX_SWEEP_INTERVAL_MINUTES) * 60)
    }
}

fn hours(value: u64) -> chrono::Duration {
    let capped = value.min(MAX_WINDOW_HOURS) as i64;
    chrono::Duration::try_hours(capped).unwrap_or(chrono::Duration::MAX)
}

/// Where the two documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `scriptdesk.db` in the data directory.
    Sqlite,
    /// One `<key>.json` file per document in the data directory.
    Json,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

/// Assistant backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// "gemini" or "echo".
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Override the backend base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Give up on a generation after this many seconds. Unset means wait
    /// indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_secs: None,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_config_default_values() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.retention.ttl_hours, 24);
        assert_eq!(config.retention.sweep_interval_minutes, 60);
        assert_eq!(config.recent_window_hours, 24);
        assert!(config.seed_default_scripts);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.generator.provider, "gemini");
        assert!(config.generator.timeout_secs.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_workspace_config_deserialize_empty() {
        let config: WorkspaceConfig = toml::from_str("").unwrap();
        assert_eq!(config.retention.ttl_hours, 24);
        assert_eq!(config.generator.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_workspace_config_deserialize_with_values() {
        let toml_str = r#"
recent_window_hours = 12
seed_default_scripts = false

[retention]
ttl_hours = 48
sweep_interval_minutes = 15

[storage]
backend = "json"

[generator]
provider = "echo"
timeout_secs = 30

[logging]
json = true
"#;
        let config: WorkspaceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.recent_window_hours, 12);
        assert!(!config.seed_default_scripts);
        assert_eq!(config.retention.ttl(), chrono::Duration::hours(48));
        assert_eq!(config.retention.sweep_interval(), Duration::from_secs(900));
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.generator.provider, "echo");
        assert_eq!(config.generator.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.generator.model, "gemini-1.5-flash");
        assert!(config.logging.json);
        assert!(!config.logging.otel);
    }

    #[test]
    fn test_huge_durations_are_capped() {
        let toml_str = r#"
recent_window_hours = 9000000000000000000

[retention]
ttl_hours = 3000000000000000
sweep_interval_minutes = 9000000000000000000
"#;
        let config: WorkspaceConfig = toml::from_str(toml_str).unwrap();
        let cap = chrono::Duration::hours(MAX_WINDOW_HOURS as i64);
        assert_eq!(config.retention.ttl(), cap);
        assert_eq!(config.recent_window(), cap);
        assert_eq!(
            config.retention.sweep_interval(),
            Duration::from_secs(MAX_SWEEP_INTERVAL_MINUTES * 60)
        );
    }

    #[test]
    fn test_storage_backend_display() {
        assert_eq!(StorageBackend::Sqlite.to_string(), "sqlite");
        assert_eq!(StorageBackend::Json.to_string(), "json");
    }
}
