//! TOML-based application configuration.
//!
//! Stores deployment settings including:
//! - Reporter schedule, trailing window and endpoint
//! - Default base URL used until the host stores an override
//! - Application identity table overrides
//! - Key-value database location
//!
//! Configuration is stored at `~/.config/mindguard/config.toml`.
//! Credentials are not kept here; they live in the key-value store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;

/// Usage reporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Base URL used when no override has been stored.
    #[serde(default = "default_base_url")]
    pub default_base_url: String,
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,
    /// Seconds between two report ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Length of the trailing usage window sampled on each tick.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Application identity table configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Optional external TOML table (`[apps]` package id -> display name).
    #[serde(default)]
    pub table_path: Option<String>,
    /// Inline overrides, applied after the file.
    #[serde(default)]
    pub apps: HashMap<String, String>,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key-value database location; defaults to the data directory.
    #[serde(default)]
    pub database_path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/mindguard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reporter: ReporterConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_base_url() -> String {
    "http://localhost:5281".into()
}
fn default_endpoint_path() -> String {
    "/api/MindfulReminder/productivity".into()
}
fn default_interval_secs() -> u64 {
    5 * 60
}
fn default_window_secs() -> u64 {
    60 * 60
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            default_base_url: default_base_url(),
            endpoint_path: default_endpoint_path(),
            interval_secs: default_interval_secs(),
            window_secs: default_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ReporterConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::path()?)
    }

    /// Load from an explicit path, writing defaults there only if the file
    /// does not exist. Any other read failure is returned untouched.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.reporter.default_base_url, "http://localhost:5281");
        assert_eq!(parsed.reporter.interval_secs, 300);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.reporter.interval(), Duration::from_secs(300));
        assert_eq!(cfg.reporter.window(), Duration::from_secs(3600));
        assert_eq!(
            cfg.reporter.endpoint_path,
            "/api/MindfulReminder/productivity"
        );
        assert!(cfg.identity.table_path.is_none());
        assert!(cfg.identity.apps.is_empty());
        assert!(cfg.storage.database_path.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            "[reporter]\ninterval_secs = 60\n\n[identity.apps]\n\"org.example.reader\" = \"Reader\"\n",
        )
        .unwrap();
        assert_eq!(cfg.reporter.interval_secs, 60);
        assert_eq!(cfg.reporter.window_secs, 3600);
        assert_eq!(
            cfg.identity.apps.get("org.example.reader").map(String::as_str),
            Some("Reader")
        );
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("reporter.interval_secs").as_deref(), Some("300"));
        assert_eq!(
            cfg.get("reporter.default_base_url").as_deref(),
            Some("http://localhost:5281")
        );
        assert!(cfg.get("reporter.missing_key").is_none());
    }

    #[test]
    fn apply_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.apply("reporter.interval_secs", "120").unwrap();
        cfg.apply("reporter.default_base_url", "https://api.example.com")
            .unwrap();
        assert_eq!(cfg.reporter.interval_secs, 120);
        assert_eq!(cfg.reporter.default_base_url, "https://api.example.com");
    }

    #[test]
    fn apply_sets_optional_path() {
        let mut cfg = Config::default();
        cfg.apply("identity.table_path", "/etc/mindguard/apps.toml")
            .unwrap();
        assert_eq!(
            cfg.identity.table_path.as_deref(),
            Some("/etc/mindguard/apps.toml")
        );
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.apply("reporter.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_number() {
        let mut cfg = Config::default();
        let result = cfg.apply("reporter.interval_secs", "soon");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.reporter.interval_secs, 300);
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reporter\ninterval_secs = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn unreadable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = [0xff, 0xfe, b'[', b'r', 0x80];
        std::fs::write(&path, original).unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn zero_interval_is_clamped_to_one_second() {
        let mut cfg = Config::default();
        cfg.reporter.interval_secs = 0;
        assert_eq!(cfg.reporter.interval(), Duration::from_secs(1));
    }
}
