//! Console client configuration.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the console client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend base URL
    pub base_url: String,
    /// Seconds between conversation-list refreshes
    pub roster_refresh_secs: u64,
    /// Seconds between refreshes of the open conversation
    pub conversation_refresh_secs: u64,
    /// Messages requested per conversation page
    pub page_limit: usize,
    /// Upper bound for attachment selection
    pub max_attachment_bytes: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            roster_refresh_secs: 10,
            conversation_refresh_secs: 5,
            page_limit: 50,
            max_attachment_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ConsoleConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.chatdesk/console.toml`
    /// Can be overridden with the `CHATDESK_CONSOLE_CONFIG` environment
    /// variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("CHATDESK_CONSOLE_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".chatdesk/console.toml"))
            .unwrap_or_else(|| PathBuf::from("console.toml"))
    }

    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("console.toml");

        let config = ConsoleConfig::load_from_path(&path).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("console.toml");
        fs::write(&path, "base_url = \"https://console.example\"\npage_limit = 100\n").unwrap();

        let config = ConsoleConfig::load_from_path(&path).unwrap();
        assert_eq!(config.base_url, "https://console.example");
        assert_eq!(config.page_limit, 100);
        assert_eq!(config.roster_refresh_secs, 10);
        assert_eq!(config.conversation_refresh_secs, 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("console.toml");
        fs::write(&path, "base_url = [not toml").unwrap();

        assert!(ConsoleConfig::load_from_path(&path).is_err());
    }
}
