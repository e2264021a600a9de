//! Filesystem adapters for ScriptDesk.
//!
//! Provides the JSON-file document store and data directory resolution.

pub mod json_store;

use std::path::PathBuf;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "SCRIPTDESK_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SCRIPTDESK_DATA_DIR` environment variable
/// 2. `~/.scriptdesk`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".scriptdesk");
    }

    // Last resort: current directory
    PathBuf::from(".scriptdesk")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_is_scriptdesk_dir() {
        let dir = resolve_data_dir();
        match std::env::var(DATA_DIR_ENV) {
            Ok(custom) => assert_eq!(dir, PathBuf::from(custom)),
            Err(_) => assert!(dir.ends_with(".scriptdesk")),
        }
    }
}
