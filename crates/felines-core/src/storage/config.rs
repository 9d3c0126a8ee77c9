//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Milestone interval for the like counter
//! - Notification display window and message
//! - Audio cue volume, mute and optional RNG seed
//! - Content source endpoint and field
//! - Theme flag
//!
//! Configuration is stored at `~/.config/felines/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};

/// Like counter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// `{count}` is replaced by the like count.
    #[serde(default = "default_milestone_message")]
    pub milestone_message: String,
}

/// Audio cue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// When false the engine runs without a playback backend.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    /// Fixed seed for cue selection (random when unset).
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Remote content configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// JSON field holding the text.
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default = "default_key")]
    pub default_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve built-in facts instead of calling the network.
    #[serde(default)]
    pub offline: bool,
}

/// UI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/felines/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engagement: EngagementConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

// Default functions
fn default_milestone_interval() -> u64 {
    crate::engagement::DEFAULT_MILESTONE_INTERVAL
}
fn default_true() -> bool {
    true
}
fn default_duration_ms() -> u64 {
    crate::notification::DEFAULT_DISPLAY_MS
}
fn default_milestone_message() -> String {
    crate::orchestrator::DEFAULT_MILESTONE_MESSAGE.into()
}
fn default_volume() -> f32 {
    crate::audio::DEFAULT_VOLUME
}
fn default_base_url() -> String {
    "https://catfact.ninja".into()
}
fn default_field() -> String {
    crate::content::DEFAULT_FIELD.into()
}
fn default_key() -> String {
    "fact".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            milestone_interval: default_milestone_interval(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: default_duration_ms(),
            milestone_message: default_milestone_message(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
            muted: false,
            seed: None,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            field: default_field(),
            default_key: default_key(),
            timeout_secs: default_timeout_secs(),
            offline: false,
        }
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
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                // Unset optionals accept any JSON literal, falling back to a string.
                serde_json::Value::Null => serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Reject values no component can run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engagement.milestone_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engagement.milestone_interval".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.content.field.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "content.field".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// validated, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there only when the file does not
    /// exist. An unreadable file is an error and is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string()).into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is untouched on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Same as [`Config::apply`], plus failures writing the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
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
        assert_eq!(parsed.engagement.milestone_interval, 5);
        assert_eq!(parsed.notifications.duration_ms, 3_000);
        assert_eq!(parsed.audio.volume, 0.5);
        assert_eq!(parsed.content.base_url, "https://catfact.ninja");
        assert!(!parsed.ui.dark_mode);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[audio]\nmuted = true\n").unwrap();
        assert!(parsed.audio.muted);
        assert_eq!(parsed.audio.volume, 0.5);
        assert_eq!(parsed.engagement.milestone_interval, 5);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("ui.dark_mode").as_deref(), Some("false"));
        assert_eq!(cfg.get("engagement.milestone_interval").as_deref(), Some("5"));
        assert_eq!(cfg.get("content.field").as_deref(), Some("fact"));
        assert!(cfg.get("ui.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("audio.volume", "0.25").unwrap();
        cfg.apply("audio.muted", "true").unwrap();
        cfg.apply("engagement.milestone_interval", "10").unwrap();
        cfg.apply("content.base_url", "http://localhost:9000").unwrap();
        cfg.apply("audio.seed", "42").unwrap();

        assert_eq!(cfg.audio.volume, 0.25);
        assert!(cfg.audio.muted);
        assert_eq!(cfg.engagement.milestone_interval, 10);
        assert_eq!(cfg.content.base_url, "http://localhost:9000");
        assert_eq!(cfg.audio.seed, Some(42));
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("audio.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
        assert!(cfg.apply("", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("ui.dark_mode", "not_a_bool").is_err());
        assert!(cfg.apply("audio.volume", "loud").is_err());
    }

    #[test]
    fn apply_rejects_zero_interval_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.apply("engagement.milestone_interval", "0").is_err());
        assert_eq!(cfg.engagement.milestone_interval, 5);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.engagement.milestone_interval, 5);
        let written: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.audio.volume, 0.5);
    }

    #[test]
    fn non_utf8_file_is_an_error_and_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = b"[audio]\nvolume = 0.9\n# caf\xE9\n".to_vec();
        std::fs::write(&path, &original).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::LoadFailed { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn malformed_toml_is_an_error_and_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[audio\nvolume = 0.9\n").unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[audio\nvolume = 0.9\n");
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("audio.volume", "0.9").unwrap();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap().audio.volume, 0.9);
    }
}
