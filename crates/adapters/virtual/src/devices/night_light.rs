//! Virtual night light — a two-field subsystem (activation and auto mode).

use std::sync::{Mutex, PoisonError};

use modekeeper_app::ports::ToggleCapability;
use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::value::SettingValue;

use super::Faults;

const ACTIVATED: &str = "activated";
const AUTO_MODE: &str = "auto_mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    activated: bool,
    auto_mode: i64,
}

/// A simulated night light, exchanged as a [`SettingValue::Record`] with
/// `activated` (bool) and `auto_mode` (int) fields.
///
/// Turning it off for a mode must also disable its automatic schedule,
/// otherwise the schedule would switch it back on.
pub struct VirtualNightLight {
    state: Mutex<State>,
    faults: Faults,
}

impl VirtualNightLight {
    #[must_use]
    pub fn new(activated: bool, auto_mode: i64) -> Self {
        Self {
            state: Mutex::new(State {
                activated,
                auto_mode,
            }),
            faults: Faults::default(),
        }
    }

    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .activated
    }

    #[must_use]
    pub fn auto_mode(&self) -> i64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .auto_mode
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Record value that switches the night light off without a schedule.
    #[must_use]
    pub fn off() -> SettingValue {
        SettingValue::record([
            (ACTIVATED, SettingValue::Bool(false)),
            (AUTO_MODE, SettingValue::Int(0)),
        ])
    }
}

impl ToggleCapability for VirtualNightLight {
    fn read(&self) -> Result<SettingValue, CapabilityError> {
        self.faults.check_read("night light")?;
        let state = *self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(SettingValue::record([
            (ACTIVATED, SettingValue::Bool(state.activated)),
            (AUTO_MODE, SettingValue::Int(state.auto_mode)),
        ]))
    }

    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError> {
        self.faults.check_write("night light")?;
        let invalid = CapabilityError::InvalidValue {
            expected: "night light record",
        };
        let activated = value
            .field(ACTIVATED)
            .and_then(SettingValue::as_bool)
            .ok_or_else(|| invalid.clone())?;
        let auto_mode = value
            .field(AUTO_MODE)
            .and_then(SettingValue::as_int)
            .ok_or(invalid)?;
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = State {
            activated,
            auto_mode,
        };
        tracing::debug!(activated, auto_mode, "virtual night light written");
        Ok(())
    }
}
