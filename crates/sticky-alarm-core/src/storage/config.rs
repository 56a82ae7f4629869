//! TOML-based application configuration.
//!
//! Stores the ritual settings:
//! - Active window (start and end time of day)
//! - Alarm presentation (snooze length, sound, text, fullscreen)
//! - Trigger sites and trigger apps for relapse detection
//! - Apps launched once the routine is confirmed
//!
//! Configuration is stored at `~/.config/sticky-alarm/config.toml`.
//!
//! Values are clamped into range by [`Config::normalized`] whenever a
//! configuration is loaded or edited, so the scheduler never re-validates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::orchestrator::AlarmSettings;
use crate::ritual::{ActiveWindow, ClockTime};

pub const MIN_SNOOZE_MINUTES: u32 = 1;
pub const MAX_SNOOZE_MINUTES: u32 = 999;

/// Active window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u8,
    #[serde(default)]
    pub start_minute: u8,
    #[serde(default = "default_end_hour")]
    pub end_hour: u8,
    #[serde(default)]
    pub end_minute: u8,
}

/// Alarm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    /// Path to the alarm sound. Unset means the platform's default alarm sound.
    #[serde(default)]
    pub sound_file: Option<String>,
    #[serde(default = "default_popup_text")]
    pub popup_text: String,
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    /// Sound files the user added next to the system sounds.
    #[serde(default)]
    pub custom_sounds: Vec<String>,
}

/// Relapse triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Keywords matched against browser window titles.
    #[serde(default = "default_trigger_sites")]
    pub sites: Vec<String>,
    /// Process names (`game.exe`) that count as a relapse when running.
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Apps started after the routine is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineConfig {
    #[serde(default)]
    pub launch_apps: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/sticky-alarm/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub routine: RoutineConfig,
    /// Start at login.
    #[serde(default)]
    pub autostart: bool,
}

// Default functions
fn default_start_hour() -> u8 {
    20
}
fn default_end_hour() -> u8 {
    4
}
fn default_snooze_minutes() -> u32 {
    15
}
fn default_popup_text() -> String {
    "Your system delivered today.\nNow it may rest.".into()
}
fn default_true() -> bool {
    true
}
fn default_trigger_sites() -> Vec<String> {
    ["youtube", "instagram", "reddit", "twitter", "tiktok", "facebook", "twitch"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            start_minute: 0,
            end_hour: default_end_hour(),
            end_minute: 0,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            snooze_minutes: default_snooze_minutes(),
            sound_file: None,
            popup_text: default_popup_text(),
            fullscreen: true,
            custom_sounds: Vec::new(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            sites: default_trigger_sites(),
            apps: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            alarm: AlarmConfig::default(),
            triggers: TriggerConfig::default(),
            routine: RoutineConfig::default(),
            autostart: false,
        }
    }
}

/// Trim, drop blanks and drop case-insensitive duplicates, keeping order.
fn ordered_set(items: Vec<String>, map: impl Fn(&str) -> String) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .map(|item| map(item.trim()))
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

fn with_exe_suffix(name: &str) -> String {
    if name.is_empty() || name.to_lowercase().ends_with(".exe") {
        name.to_string()
    } else {
        format!("{name}.exe")
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
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Array(_) => {
                    // Accept a JSON array or a comma-separated list.
                    if value.trim_start().starts_with('[') {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    } else {
                        serde_json::Value::Array(
                            value
                                .split(',')
                                .map(|s| serde_json::Value::String(s.trim().to_string()))
                                .collect(),
                        )
                    }
                }
                serde_json::Value::Object(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Clamp numbers into range and tidy the lists.
    ///
    /// Hours are clamped to 0-23, minutes to 0-59, the snooze length to
    /// 1-999 minutes. Sites are lower-cased, app names get a `.exe` suffix,
    /// and every list is trimmed and de-duplicated in order.
    pub fn normalized(mut self) -> Self {
        let w = &mut self.window;
        w.start_hour = w.start_hour.min(23);
        w.start_minute = w.start_minute.min(59);
        w.end_hour = w.end_hour.min(23);
        w.end_minute = w.end_minute.min(59);

        self.alarm.snooze_minutes = self
            .alarm
            .snooze_minutes
            .clamp(MIN_SNOOZE_MINUTES, MAX_SNOOZE_MINUTES);
        self.alarm.sound_file = self
            .alarm
            .sound_file
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.alarm.custom_sounds = ordered_set(std::mem::take(&mut self.alarm.custom_sounds), str::to_string);

        self.triggers.sites = ordered_set(std::mem::take(&mut self.triggers.sites), str::to_lowercase);
        self.triggers.apps = ordered_set(std::mem::take(&mut self.triggers.apps), with_exe_suffix);
        self.routine.launch_apps =
            ordered_set(std::mem::take(&mut self.routine.launch_apps), str::to_string);
        self
    }

    pub fn active_window(&self) -> ActiveWindow {
        ActiveWindow::new(
            ClockTime::new(self.window.start_hour, self.window.start_minute),
            ClockTime::new(self.window.end_hour, self.window.end_minute),
        )
    }

    pub fn alarm_settings(&self) -> AlarmSettings {
        AlarmSettings {
            sound_file: self.alarm.sound_file.as_ref().map(PathBuf::from),
            text: self.alarm.popup_text.clone(),
            fullscreen: self.alarm.fullscreen,
        }
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg.normalized())
            }
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

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by key without saving. The result is normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        *self = updated.normalized();
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
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
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.window.start_hour, 20);
        assert_eq!(cfg.window.end_hour, 4);
        assert_eq!(cfg.alarm.snooze_minutes, 15);
        assert!(cfg.alarm.fullscreen);
        assert!(cfg.alarm.sound_file.is_none());
        assert_eq!(cfg.triggers.sites.len(), 7);
        assert!(cfg.triggers.sites.contains(&"youtube".to_string()));
        assert!(cfg.triggers.apps.is_empty());
        assert!(!cfg.autostart);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[window]\nstart_hour = 21\n").unwrap();
        assert_eq!(cfg.window.start_hour, 21);
        assert_eq!(cfg.window.end_hour, 4);
        assert_eq!(cfg.alarm.snooze_minutes, 15);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("alarm.fullscreen").as_deref(), Some("true"));
        assert_eq!(cfg.get("alarm.snooze_minutes").as_deref(), Some("15"));
        assert_eq!(cfg.get("window.start_hour").as_deref(), Some("20"));
        assert!(cfg.get("alarm.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("alarm.fullscreen", "false").unwrap();
        cfg.apply("window.start_hour", "22").unwrap();
        cfg.apply("alarm.popup_text", "Lights out").unwrap();
        assert!(!cfg.alarm.fullscreen);
        assert_eq!(cfg.window.start_hour, 22);
        assert_eq!(cfg.alarm.popup_text, "Lights out");
    }

    #[test]
    fn apply_accepts_lists() {
        let mut cfg = Config::default();
        cfg.apply("triggers.apps", "Steam, game").unwrap();
        assert_eq!(cfg.triggers.apps, vec!["Steam.exe", "game.exe"]);

        cfg.apply("triggers.sites", r#"["Netflix", "netflix", " "]"#).unwrap();
        assert_eq!(cfg.triggers.sites, vec!["netflix"]);
    }

    #[test]
    fn apply_sets_optional_sound() {
        let mut cfg = Config::default();
        cfg.apply("alarm.sound_file", "C:/Windows/Media/Alarm01.wav").unwrap();
        assert_eq!(
            cfg.alarm.sound_file.as_deref(),
            Some("C:/Windows/Media/Alarm01.wav")
        );
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.apply("alarm.volume", "3");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.apply("", "3"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.apply("alarm.fullscreen", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        let result = cfg.apply("window.start_hour", "-1");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn normalization_clamps_out_of_range_numbers() {
        let mut cfg = Config::default();
        cfg.window.start_hour = 31;
        cfg.window.start_minute = 75;
        cfg.alarm.snooze_minutes = 0;
        let cfg = cfg.normalized();
        assert_eq!(cfg.window.start_hour, 23);
        assert_eq!(cfg.window.start_minute, 59);
        assert_eq!(cfg.alarm.snooze_minutes, MIN_SNOOZE_MINUTES);

        let mut cfg = Config::default();
        cfg.alarm.snooze_minutes = 5000;
        assert_eq!(cfg.normalized().alarm.snooze_minutes, MAX_SNOOZE_MINUTES);
    }

    #[test]
    fn normalization_tidies_lists() {
        let mut cfg = Config::default();
        cfg.triggers.sites = vec!["YouTube".into(), " youtube ".into(), "".into()];
        cfg.triggers.apps = vec!["Game".into(), "game.EXE".into()];
        cfg.routine.launch_apps = vec!["C:/Apps/notes.exe".into(), "  ".into()];
        cfg.alarm.sound_file = Some("   ".into());
        let cfg = cfg.normalized();
        assert_eq!(cfg.triggers.sites, vec!["youtube"]);
        assert_eq!(cfg.triggers.apps, vec!["Game.exe"]);
        assert_eq!(cfg.routine.launch_apps, vec!["C:/Apps/notes.exe"]);
        assert_eq!(cfg.alarm.sound_file, None);
    }

    #[test]
    fn active_window_and_alarm_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.active_window().to_string(), "20:00-04:00");
        let alarm = cfg.alarm_settings();
        assert!(alarm.fullscreen);
        assert_eq!(alarm.text, cfg.alarm.popup_text);
        assert_eq!(alarm.sound_file, None);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("routine.launch_apps", "C:/Tools/journal.exe").unwrap();
        cfg.apply("alarm.snooze_minutes", "5").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.alarm.snooze_minutes, 5);
        assert_eq!(loaded.routine.launch_apps, vec!["C:/Tools/journal.exe"]);
    }

    #[test]
    fn load_normalizes_hand_edited_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[alarm]\nsnooze_minutes = 0\n[window]\nend_hour = 40\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.alarm.snooze_minutes, 1);
        assert_eq!(cfg.window.end_hour, 23);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "window = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
