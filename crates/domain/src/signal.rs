//! Signal — an external notification the engines react to.
//!
//! Signals cover configuration changes (a watched setting key was written)
//! and device lifecycle broadcasts (screen off, shutdown, battery saver).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Something that happened outside the engines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// A persisted setting under `key` was written by someone.
    SettingChanged { key: String },
    ScreenOff,
    ShutdownInitiated,
    BatterySaverEngaged,
}

impl Signal {
    /// Convenience constructor for [`Signal::SettingChanged`].
    #[must_use]
    pub fn setting_changed(key: impl Into<String>) -> Self {
        Self::SettingChanged { key: key.into() }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingChanged { key } => write!(f, "setting_changed({key})"),
            Self::ScreenOff => f.write_str("screen_off"),
            Self::ShutdownInitiated => f.write_str("shutdown_initiated"),
            Self::BatterySaverEngaged => f.write_str("battery_saver_engaged"),
        }
    }
}

/// Selects which [`Signal`]s a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
pub enum SignalFilter {
    /// Changes of one setting key.
    SettingChanged(String),
    ScreenOff,
    ShutdownInitiated,
    BatterySaverEngaged,
}

impl SignalFilter {
    #[must_use]
    pub fn matches(&self, signal: &Signal) -> bool {
        match (self, signal) {
            (Self::SettingChanged(wanted), Signal::SettingChanged { key }) => wanted == key,
            (Self::ScreenOff, Signal::ScreenOff)
            | (Self::ShutdownInitiated, Signal::ShutdownInitiated)
            | (Self::BatterySaverEngaged, Signal::BatterySaverEngaged) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SignalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingChanged(key) => write!(f, "setting_changed({key})"),
            Self::ScreenOff => f.write_str("screen_off"),
            Self::ShutdownInitiated => f.write_str("shutdown_initiated"),
            Self::BatterySaverEngaged => f.write_str("battery_saver_engaged"),
        }
    }
}

/// Error returned when parsing an unknown lifecycle signal name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal {0:?}")]
pub struct UnknownSignal(pub String);

impl FromStr for Signal {
    type Err = UnknownSignal;

    /// Parse a lifecycle signal name (`screen_off`, `shutdown`, `battery_saver`,
    /// …). Setting changes are written as `setting:<key>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(key) = s.strip_prefix("setting:") {
            return Ok(Self::setting_changed(key));
        }
        match s {
            "screen_off" | "screen-off" => Ok(Self::ScreenOff),
            "shutdown" | "shutdown_initiated" => Ok(Self::ShutdownInitiated),
            "battery_saver" | "battery-saver" | "battery_saver_engaged" => {
                Ok(Self::BatterySaverEngaged)
            }
            other => Err(UnknownSignal(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_same_lifecycle_signal() {
        assert!(SignalFilter::ScreenOff.matches(&Signal::ScreenOff));
        assert!(!SignalFilter::ScreenOff.matches(&Signal::ShutdownInitiated));
    }

    #[test]
    fn should_match_setting_change_only_for_same_key() {
        let filter = SignalFilter::SettingChanged("auto.mode".to_string());
        assert!(filter.matches(&Signal::setting_changed("auto.mode")));
        assert!(!filter.matches(&Signal::setting_changed("auto.window")));
        assert!(!filter.matches(&Signal::ScreenOff));
    }

    #[test]
    fn should_parse_lifecycle_names() {
        assert_eq!("screen-off".parse::<Signal>().unwrap(), Signal::ScreenOff);
        assert_eq!(
            "shutdown".parse::<Signal>().unwrap(),
            Signal::ShutdownInitiated
        );
        assert_eq!(
            "battery_saver".parse::<Signal>().unwrap(),
            Signal::BatterySaverEngaged
        );
    }

    #[test]
    fn should_parse_setting_change_with_key() {
        assert_eq!(
            "setting:auto.active".parse::<Signal>().unwrap(),
            Signal::setting_changed("auto.active")
        );
    }

    #[test]
    fn should_reject_unknown_signal_name() {
        assert!("reboot".parse::<Signal>().is_err());
    }

    #[test]
    fn should_display_signal_variants() {
        assert_eq!(Signal::ScreenOff.to_string(), "screen_off");
        assert_eq!(
            Signal::setting_changed("k").to_string(),
            "setting_changed(k)"
        );
    }
}
