//! Revert trigger — an external signal that forces an active mode to end.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ToggleId;
use crate::signal::SignalFilter;

/// Describes a signal that deactivates the mode while it is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertTrigger {
    pub on: SignalFilter,
    /// Skip arming when this toggle participates in the activation.
    ///
    /// Reverting on battery saver makes no sense when the mode itself forces
    /// battery saver off.
    #[serde(default)]
    pub unless_toggle_enabled: Option<ToggleId>,
}

impl RevertTrigger {
    #[must_use]
    pub fn new(on: SignalFilter) -> Self {
        Self {
            on,
            unless_toggle_enabled: None,
        }
    }

    #[must_use]
    pub fn screen_off() -> Self {
        Self::new(SignalFilter::ScreenOff)
    }

    #[must_use]
    pub fn shutdown() -> Self {
        Self::new(SignalFilter::ShutdownInitiated)
    }

    #[must_use]
    pub fn battery_saver() -> Self {
        Self::new(SignalFilter::BatterySaverEngaged)
    }

    #[must_use]
    pub fn unless_toggle_enabled(mut self, toggle: ToggleId) -> Self {
        self.unless_toggle_enabled = Some(toggle);
        self
    }

    /// Whether this trigger should be armed for an activation touching
    /// `participating` toggles.
    #[must_use]
    pub fn should_arm<'a>(&self, mut participating: impl Iterator<Item = &'a ToggleId>) -> bool {
        match &self.unless_toggle_enabled {
            Some(blocker) => !participating.any(|id| id == blocker),
            None => true,
        }
    }
}

impl fmt::Display for RevertTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unless_toggle_enabled {
            Some(blocker) => write!(f, "{} unless {blocker}", self.on),
            None => write!(f, "{}", self.on),
        }
    }
}
