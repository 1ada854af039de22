//! Session state of an override engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signal::SignalFilter;

/// Whether an override mode is currently applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Inactive,
    Active,
}

impl SessionState {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Decode the persisted active marker (`1` = active, anything else inactive).
    #[must_use]
    pub fn from_marker(marker: i64) -> Self {
        if marker == 1 {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Encode for the persisted active marker.
    #[must_use]
    pub fn marker(self) -> i64 {
        i64::from(self.is_active())
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => f.write_str("inactive"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Why a deactivation was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// An armed revert trigger fired.
    Trigger(SignalFilter),
    /// The user pressed the indicator's stop action.
    UserStop,
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger(filter) => write!(f, "trigger({filter})"),
            Self::UserStop => f.write_str("user_stop"),
        }
    }
}
