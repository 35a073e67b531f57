// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::ChronosError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where the simulation service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Service root; requests go to `<base_url>/api/<endpoint>`.
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Ask the service for an illustration after every turn.
    #[serde(default = "default_true")]
    pub illustrations: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_seconds: 120,
            illustrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    /// Play the tick/chaos cue when the timeline jumps.
    #[serde(default = "default_true")]
    pub cues: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: crate::audio::DEFAULT_SAMPLE_RATE,
            cues: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file; defaults to the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(paths::db_path)
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, ChronosError> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ChronosError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ChronosError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ChronosError> {
        if self.audio.sample_rate == 0 {
            return Err(ChronosError::Config(
                "audio.sample_rate must be positive".into(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ChronosError::Config("api.base_url is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(c.api.timeout_seconds, 120);
        assert!(c.api.illustrations);
        assert!(c.audio.enabled);
        assert!(c.audio.cues);
        assert_eq!(c.audio.sample_rate, 24_000);
        assert_eq!(c.storage.backend, StorageBackend::Sqlite);
        assert!(c.storage.path.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.audio.sample_rate, 24_000);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[api]
base_url = "https://chronos.example.com"
timeout_seconds = 30
illustrations = false

[audio]
enabled = false
sample_rate = 48000
cues = false

[storage]
backend = "memory"
path = "/tmp/chronos.db"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://chronos.example.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(!config.api.illustrations);
        assert!(!config.audio.enabled);
        assert!(!config.audio.cues);
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.storage.db_path(),
            PathBuf::from("/tmp/chronos.db")
        );
    }

    #[test]
    fn test_audio_cues_default_when_omitted() {
        let toml_str = r#"
[audio]
enabled = true
sample_rate = 24000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.audio.cues);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_zero_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[audio]\nenabled = true\nsample_rate = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ChronosError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.api.base_url, config.api.base_url);
        assert_eq!(deserialized.audio.sample_rate, config.audio.sample_rate);
    }
}
