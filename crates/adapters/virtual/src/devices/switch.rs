//! Virtual switch — an on/off subsystem (heads-up, do not disturb, bluetooth…).

use std::sync::{Mutex, PoisonError};

use modekeeper_app::ports::ToggleCapability;
use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::value::SettingValue;

use super::Faults;

/// A simulated subsystem that is either on or off.
pub struct VirtualSwitch {
    name: String,
    state: Mutex<bool>,
    faults: Faults,
}

impl VirtualSwitch {
    #[must_use]
    pub fn new(name: impl Into<String>, on: bool) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(on),
            faults: Faults::default(),
        }
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the state behind the engine's back, like a user would.
    pub fn set(&self, on: bool) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = on;
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

impl ToggleCapability for VirtualSwitch {
    fn read(&self) -> Result<SettingValue, CapabilityError> {
        self.faults.check_read(&self.name)?;
        Ok(SettingValue::Bool(self.is_on()))
    }

    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError> {
        self.faults.check_write(&self.name)?;
        let SettingValue::Bool(on) = *value else {
            return Err(CapabilityError::InvalidValue { expected: "bool" });
        };
        self.set(on);
        tracing::debug!(switch = %self.name, on, "virtual switch written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_current_state() {
        let switch = VirtualSwitch::new("zen", true);
        assert_eq!(switch.read().unwrap(), SettingValue::Bool(true));
    }

    #[test]
    fn should_turn_off_when_written() {
        let switch = VirtualSwitch::new("zen", true);
        switch.write(&SettingValue::Bool(false)).unwrap();
        assert!(!switch.is_on());
    }

    #[test]
    fn should_reject_non_bool_value() {
        let switch = VirtualSwitch::new("zen", true);
        let result = switch.write(&SettingValue::Int(0));
        assert_eq!(
            result,
            Err(CapabilityError::InvalidValue { expected: "bool" })
        );
        assert!(switch.is_on());
    }

    #[test]
    fn should_fail_reads_when_asked() {
        let switch = VirtualSwitch::new("zen", true);
        switch.faults().fail_reads(true);
        assert!(matches!(
            switch.read(),
            Err(CapabilityError::ReadFailed { .. })
        ));
    }

    #[test]
    fn should_fail_writes_when_asked() {
        let switch = VirtualSwitch::new("zen", true);
        switch.faults().fail_writes(true);
        assert!(switch.write(&SettingValue::Bool(false)).is_err());
        assert!(switch.is_on());
    }
}
