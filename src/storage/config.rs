//! Engine configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Database settings
    pub database: DatabaseSettings,
    /// Challenge creation and membership limits
    pub challenges: ChallengeSettings,
    /// Workout processing settings
    pub processing: ProcessingSettings,
    /// Finalization sweep settings
    pub scheduler: SchedulerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            database: DatabaseSettings::default(),
            challenges: ChallengeSettings::default(),
            processing: ProcessingSettings::default(),
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Resolved path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.file_name)
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// File name inside the data directory
    pub file_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            file_name: "fitquest.db".to_string(),
        }
    }
}

/// Challenge limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeSettings {
    /// Shortest allowed challenge window in days
    pub min_duration_days: i64,
    /// Longest allowed challenge window in days
    pub max_duration_days: i64,
    /// Invitations allowed at creation
    pub max_invitees: u32,
    /// Participants allowed in total, creator included
    pub max_participants: u32,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            min_duration_days: 3,
            max_duration_days: 90,
            max_invitees: 20,
            max_participants: 20,
        }
    }
}

/// Workout processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Attempts at a version-checked participant write before giving up
    pub max_update_retries: u32,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_update_retries: 5,
        }
    }
}

/// Finalization sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Seconds between lifecycle sweeps
    pub sweep_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "fitquest", "FitQuest")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from(&get_config_path(), get_data_dir())
}

/// Load configuration from `path`, falling back to defaults when absent.
pub fn load_config_from(path: &Path, data_dir: PathBuf) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EngineConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: EngineConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save configuration to `path`.
pub fn save_config(config: &EngineConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("config.toml"), dir.path().to_path_buf()).unwrap();
        assert_eq!(config.challenges.max_participants, 20);
        assert_eq!(config.database_path(), dir.path().join("fitquest.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\nsweep_interval_secs = 5\n").unwrap();

        let config = load_config_from(&path, dir.path().to_path_buf()).unwrap();
        assert_eq!(config.scheduler.sweep_interval_secs, 5);
        assert_eq!(config.challenges.min_duration_days, 3);
        assert_eq!(config.processing.max_update_retries, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let mut config = EngineConfig::default();
        config.challenges.max_participants = 12;
        save_config(&config, &path).unwrap();

        let loaded = load_config_from(&path, PathBuf::new()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "challenges = [").unwrap();
        assert!(matches!(
            load_config_from(&path, PathBuf::new()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
