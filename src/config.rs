//! Client configuration
//!
//! Runtime configuration for the client core: backend endpoint, request
//! timeout, and the delay before the quiet conversation-list refresh that
//! follows opening a thread.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the AgroConecta backend (e.g. "https://api.agroconecta.co")
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Delay before the silent conversation-list refresh after opening a thread
    pub quiet_refresh_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.agroconecta.co".to_string(),
            request_timeout_secs: 10,
            quiet_refresh_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file
    ///
    /// Returns defaults if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or deserialized
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path_ref)
            .map_err(|e| Error::Storage(format!("Failed to read config file: {}", e)))?;

        let config: ClientConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.quiet_refresh_delay_ms, 1000);
        assert!(config.api_base_url.starts_with("https://"));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("missing_config.json");

        let config = ClientConfig::load(&path).expect("Failed to load config");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");

        let config = ClientConfig {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 5,
            quiet_refresh_delay_ms: 250,
        };
        config.save(&path).expect("Failed to save config");

        let loaded = ClientConfig::load(&path).expect("Failed to load config");
        assert_eq!(loaded, config);
    }
}
