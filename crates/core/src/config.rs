//! Application Configuration
//!
//! Settings for the filter host:
//! - Where keyword preferences live
//! - How the SMS bridge reaches the device
//! - Default log filter

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SpamGuardError};

/// What the host does with a message classified as spam
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuppressMode {
    /// Remove the message from the device inbox
    #[default]
    Delete,
    /// Only log and report the message
    Report,
}

/// Preference storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the preference files, platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

/// SMS bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path to the Android SDK, detected when unset
    pub sdk_path: Option<PathBuf>,
    /// Device serial, first online device when unset
    pub device_serial: Option<String>,
    /// Inbox poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Action taken on spam
    pub suppress: SuppressMode,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sdk_path: None,
            device_serial: None,
            poll_interval_ms: 2000,
            suppress: SuppressMode::Delete,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    pub storage: StorageConfig,
    pub bridge: BridgeConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            storage: StorageConfig::default(),
            bridge: BridgeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "spamguard", "SpamGuard")
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the default data directory path
    pub fn default_data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Directory for keyword preferences
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .ok_or_else(|| SpamGuardError::Config("Cannot determine data directory".into()))
    }

    /// Load configuration from the platform config file
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| SpamGuardError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from `path`, writing defaults there when missing
    pub async fn load_from(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path).await? {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.bridge.poll_interval_ms.max(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bridge.suppress, SuppressMode::Delete);
        assert_eq!(config.bridge.poll_interval_ms, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [bridge]
            suppress = "report"
            device_serial = "emulator-5554"
            "#,
        )
        .unwrap();

        assert_eq!(config.bridge.suppress, SuppressMode::Report);
        assert_eq!(config.bridge.device_serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.bridge.poll_interval_ms, 2000);
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_explicit_data_dir() {
        let mut config = AppConfig::default();
        config.storage.data_dir = Some(PathBuf::from("/var/lib/spamguard"));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/var/lib/spamguard"));
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let config = AppConfig::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.bridge.poll_interval_ms, 2000);

        let mut changed = config.clone();
        changed.bridge.poll_interval_ms = 500;
        changed.save_to(&path).await.unwrap();

        let reloaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(reloaded.bridge.poll_interval_ms, 500);
    }
}
