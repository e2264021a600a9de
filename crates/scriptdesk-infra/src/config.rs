//! Workspace configuration loader for ScriptDesk.
//!
//! Reads `config.toml` from the data directory (`~/.scriptdesk/` in
//! production) and deserializes it into [`WorkspaceConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::Path;

use scriptdesk_types::config::{MAX_SWEEP_INTERVAL_MINUTES, MAX_WINDOW_HOURS, WorkspaceConfig};

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Shortest sweep period, in minutes.
const MIN_SWEEP_INTERVAL_MINUTES: u64 = 1;

/// Shortest message TTL, in hours.
const MIN_TTL_HOURS: u64 = 1;

/// Load workspace configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`WorkspaceConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise the parsed config, with out-of-range values clamped.
pub async fn load_workspace_config(data_dir: &Path) -> WorkspaceConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return WorkspaceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return WorkspaceConfig::default();
        }
    };

    match toml::from_str::<WorkspaceConfig>(&content) {
        Ok(config) => apply_limits(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            WorkspaceConfig::default()
        }
    }
}

/// Clamp values that would make the sweeper spin, purge everything, or
/// overflow duration arithmetic.
pub fn apply_limits(mut config: WorkspaceConfig) -> WorkspaceConfig {
    if config.retention.sweep_interval_minutes < MIN_SWEEP_INTERVAL_MINUTES {
        tracing::warn!(
            "retention.sweep_interval_minutes below {MIN_SWEEP_INTERVAL_MINUTES}, clamping"
        );
        config.retention.sweep_interval_minutes = MIN_SWEEP_INTERVAL_MINUTES;
    }
    if config.retention.ttl_hours < MIN_TTL_HOURS {
        tracing::warn!("retention.ttl_hours below {MIN_TTL_HOURS}, clamping");
        config.retention.ttl_hours = MIN_TTL_HOURS;
    }
    if config.retention.sweep_interval_minutes > MAX_SWEEP_INTERVAL_MINUTES {
        tracing::warn!(
            "retention.sweep_interval_minutes above {MAX_SWEEP_INTERVAL_MINUTES}, clamping"
        );
        config.retention.sweep_interval_minutes = MAX_SWEEP_INTERVAL_MINUTES;
    }
    if config.retention.ttl_hours > MAX_WINDOW_HOURS {
        tracing::warn!("retention.ttl_hours above {MAX_WINDOW_HOURS}, clamping");
        config.retention.ttl_hours = MAX_WINDOW_HOURS;
    }
    if config.recent_window_hours > MAX_WINDOW_HOURS {
        tracing::warn!("recent_window_hours above {MAX_WINDOW_HOURS}, clamping");
        config.recent_window_hours = MAX_WINDOW_HOURS;
    }
    config
}
