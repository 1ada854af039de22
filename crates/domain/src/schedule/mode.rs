//! Automation mode — what drives a scheduled binary setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the controlled setting is driven, persisted as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoMode {
    /// Automation never touches the setting.
    #[default]
    Disabled,
    /// Active from sunset to sunrise.
    Night,
    /// Active inside the stored time window.
    TimeWindow,
    /// Active from sunset to the stored window's end time.
    SunsetToTime,
    /// Active from the stored window's start time to sunrise.
    TimeToSunrise,
}

impl AutoMode {
    /// Decode a persisted code; unknown codes fall back to [`Disabled`](Self::Disabled).
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Night,
            2 => Self::TimeWindow,
            3 => Self::SunsetToTime,
            4 => Self::TimeToSunrise,
            _ => Self::Disabled,
        }
    }

    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::Night => 1,
            Self::TimeWindow => 2,
            Self::SunsetToTime => 3,
            Self::TimeToSunrise => 4,
        }
    }

    /// Whether the mode needs sunset/sunrise times.
    #[must_use]
    pub fn uses_twilight(self) -> bool {
        matches!(self, Self::Night | Self::SunsetToTime | Self::TimeToSunrise)
    }

    /// Whether the mode reads the stored window string.
    #[must_use]
    pub fn uses_window(self) -> bool {
        matches!(
            self,
            Self::TimeWindow | Self::SunsetToTime | Self::TimeToSunrise
        )
    }
}

impl fmt::Display for AutoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Night => f.write_str("night"),
            Self::TimeWindow => f.write_str("time_window"),
            Self::SunsetToTime => f.write_str("sunset_to_time"),
            Self::TimeToSunrise => f.write_str("time_to_sunrise"),
        }
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown automation mode {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for AutoMode {
    type Err = UnknownMode;

    /// Accepts either the snake-case name or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" | "0" => Ok(Self::Disabled),
            "night" | "1" => Ok(Self::Night),
            "time_window" | "time" | "2" => Ok(Self::TimeWindow),
            "sunset_to_time" | "3" => Ok(Self::SunsetToTime),
            "time_to_sunrise" | "4" => Ok(Self::TimeToSunrise),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
