//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `modekeeper.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;

use chrono::NaiveTime;
use serde::Deserialize;

use modekeeper_domain::error::ModeKeeperError;
use modekeeper_domain::id::ToggleId;
use modekeeper_domain::toggle::FeatureToggle;
use modekeeper_domain::trigger::RevertTrigger;
use modekeeper_domain::value::SettingValue;

const TIME_FORMAT: &str = "%H:%M";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// The override mode.
    pub mode: ModeConfig,
    /// The scheduled binary setting.
    pub automation: AutomationConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Override mode configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Name shown on the indicator.
    pub name: String,
    /// Store namespace holding the snapshot; owned by this mode alone.
    pub namespace: String,
    /// Revert when the screen turns off.
    pub screen_off_reverts: bool,
    /// Revert when battery saver engages, unless the mode itself toggles it.
    pub battery_saver_reverts: bool,
    /// Participating subsystems, in apply order.
    pub toggles: Vec<ToggleConfig>,
}

/// One `[[mode.toggles]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(rename = "override")]
    pub override_value: SettingValue,
}

/// Scheduled automation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Store namespace holding the three setting keys.
    pub namespace: String,
    pub mode_key: String,
    pub window_key: String,
    pub active_key: String,
    /// Fixed sunset time (`HH:MM`) for the night modes.
    pub sunset: String,
    /// Fixed sunrise time (`HH:MM`) for the night modes.
    pub sunrise: String,
}

fn enabled_by_default() -> bool {
    true
}

impl Config {
    /// Load configuration from `modekeeper.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("modekeeper.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MODEKEEPER_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("MODEKEEPER_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode.name.trim().is_empty() {
            return Err(ConfigError::Validation("mode name must not be empty".to_string()));
        }
        if self.mode.namespace.trim().is_empty() || self.automation.namespace.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store namespaces must not be empty".to_string(),
            ));
        }
        if self.mode.namespace == self.automation.namespace {
            return Err(ConfigError::Validation(format!(
                "mode and automation share namespace {:?}",
                self.mode.namespace
            )));
        }
        let mut seen = HashSet::new();
        for toggle in &self.mode.toggles {
            ToggleId::new(toggle.id.as_str())
                .map_err(|err| ConfigError::Validation(format!("toggle {:?}: {err}", toggle.id)))?;
            if !seen.insert(toggle.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "toggle {:?} listed twice",
                    toggle.id
                )));
            }
        }
        self.twilight()?;
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Configured toggles as domain values.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid id or override value.
    pub fn toggles(&self) -> Result<Vec<FeatureToggle>, ModeKeeperError> {
        self.mode
            .toggles
            .iter()
            .map(|toggle| {
                let builder = FeatureToggle::builder()
                    .id(toggle.id.as_str())
                    .enabled(toggle.enabled)
                    .override_value(toggle.override_value.clone());
                match &toggle.label {
                    Some(label) => builder.label(label.as_str()),
                    None => builder,
                }
                .build()
            })
            .collect()
    }

    /// Revert triggers for the mode. Shutdown always reverts.
    #[must_use]
    pub fn triggers(&self) -> Vec<RevertTrigger> {
        let mut triggers = vec![RevertTrigger::shutdown()];
        if self.mode.screen_off_reverts {
            triggers.push(RevertTrigger::screen_off());
        }
        if self.mode.battery_saver_reverts {
            let trigger = match ToggleId::new("battery_saver") {
                Ok(id) => RevertTrigger::battery_saver().unless_toggle_enabled(id),
                Err(_) => RevertTrigger::battery_saver(),
            };
            triggers.push(trigger);
        }
        triggers
    }

    /// Parsed `(sunset, sunrise)`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when either time is not `HH:MM`.
    pub fn twilight(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        let parse = |raw: &str| {
            NaiveTime::parse_from_str(raw, TIME_FORMAT)
                .map_err(|_| ConfigError::Validation(format!("invalid time {raw:?}, expected HH:MM")))
        };
        Ok((
            parse(&self.automation.sunset)?,
            parse(&self.automation.sunrise)?,
        ))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:modekeeper.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "modekeeperd=info,modekeeper=info".to_string(),
        }
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        let toggle = |id: &str, enabled: bool, value: SettingValue| ToggleConfig {
            id: id.to_string(),
            label: None,
            enabled,
            override_value: value,
        };
        Self {
            name: "Gaming".to_string(),
            namespace: "gaming".to_string(),
            screen_off_reverts: true,
            battery_saver_reverts: true,
            toggles: vec![
                toggle("heads_up", true, SettingValue::Bool(false)),
                toggle("zen", true, SettingValue::Bool(true)),
                toggle("ringer", true, SettingValue::Text("silent".to_string())),
                toggle(
                    "night_light",
                    true,
                    SettingValue::record([
                        ("activated", SettingValue::Bool(false)),
                        ("auto_mode", SettingValue::Int(0)),
                    ]),
                ),
                toggle("battery_saver", true, SettingValue::Bool(false)),
                toggle("three_finger", true, SettingValue::Bool(false)),
                toggle("extra_dim", true, SettingValue::Bool(false)),
                toggle("bluetooth", false, SettingValue::Bool(false)),
                toggle("brightness", false, SettingValue::Percent(100)),
                toggle("media_volume", false, SettingValue::Percent(80)),
            ],
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            namespace: "automation".to_string(),
            mode_key: "auto.mode".to_string(),
            window_key: "auto.window".to_string(),
            active_key: "auto.active".to_string(),
            sunset: "20:30".to_string(),
            sunrise: "06:30".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:modekeeper.db?mode=rwc");
        assert_eq!(config.mode.name, "Gaming");
        assert_eq!(config.mode.toggles.len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.mode.namespace, "gaming");
        assert_eq!(config.automation.namespace, "automation");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [mode]
            name = 'Focus'
            namespace = 'focus'
            screen_off_reverts = false
            battery_saver_reverts = false

            [[mode.toggles]]
            id = 'zen'
            label = 'Do not disturb'
            override = { type = 'bool', value = true }

            [[mode.toggles]]
            id = 'media_volume'
            enabled = false
            override = { type = 'percent', value = 0 }

            [automation]
            namespace = 'night'
            sunset = '19:45'
            sunrise = '07:10'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.mode.name, "Focus");
        assert_eq!(config.mode.toggles.len(), 2);
        assert!(config.mode.toggles[0].enabled);
        assert!(!config.mode.toggles[1].enabled);
        assert_eq!(config.mode.toggles[1].override_value, SettingValue::Percent(0));
        assert_eq!(config.automation.mode_key, "auto.mode");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_record_override() {
        let toml = "
            [[mode.toggles]]
            id = 'night_light'
            override = { type = 'record', value = { activated = { type = 'bool', value = false }, auto_mode = { type = 'int', value = 0 } } }
        ";
        let config: Config = toml::from_str(toml).unwrap();
        let value = &config.mode.toggles[0].override_value;
        assert_eq!(value.field("activated"), Some(&SettingValue::Bool(false)));
        assert_eq!(value.field("auto_mode"), Some(&SettingValue::Int(0)));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.mode.name, "Gaming");
    }

    #[test]
    fn should_reject_duplicate_toggle() {
        let mut config = Config::default();
        let first = config.mode.toggles[0].clone();
        config.mode.toggles.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_invalid_toggle_id() {
        let mut config = Config::default();
        config.mode.toggles[0].id = "not valid!".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_shared_namespace() {
        let mut config = Config::default();
        config.automation.namespace = config.mode.namespace.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_namespace() {
        let mut config = Config::default();
        config.mode.namespace = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_malformed_twilight() {
        let mut config = Config::default();
        config.automation.sunset = "sunset".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_always_include_shutdown_trigger() {
        let mut config = Config::default();
        config.mode.screen_off_reverts = false;
        config.mode.battery_saver_reverts = false;
        assert_eq!(config.triggers(), vec![RevertTrigger::shutdown()]);
    }

    #[test]
    fn should_build_domain_toggles_with_labels() {
        let mut config = Config::default();
        config.mode.toggles[1].label = Some("Do not disturb".to_string());
        let toggles = config.toggles().unwrap();
        assert_eq!(toggles[0].label, "heads_up");
        assert_eq!(toggles[1].label, "Do not disturb");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
