//! Virtual level — a stepped subsystem exposed as a percentage
//! (media volume, screen brightness).

use std::sync::{Mutex, PoisonError};

use modekeeper_app::ports::ToggleCapability;
use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::value::SettingValue;

use super::Faults;

/// A simulated subsystem with `0..=max_step` discrete steps.
///
/// Reads and writes go through [`SettingValue::Percent`]. As long as
/// `max_step <= 100` a read value written back lands on the same step.
pub struct VirtualLevel {
    name: String,
    max_step: u8,
    step: Mutex<u8>,
    faults: Faults,
}

impl VirtualLevel {
    /// `max_step` is clamped to at least one.
    #[must_use]
    pub fn new(name: impl Into<String>, max_step: u8, step: u8) -> Self {
        let max_step = max_step.max(1);
        Self {
            name: name.into(),
            max_step,
            step: Mutex::new(step.min(max_step)),
            faults: Faults::default(),
        }
    }

    #[must_use]
    pub fn step(&self) -> u8 {
        *self.step.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_step(&self, step: u8) {
        *self.step.lock().unwrap_or_else(PoisonError::into_inner) = step.min(self.max_step);
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    fn to_percent(&self, step: u8) -> u8 {
        let percent = (u32::from(step) * 100 + u32::from(self.max_step) / 2) / u32::from(self.max_step);
        u8::try_from(percent).unwrap_or(100)
    }

    fn to_step(&self, percent: u8) -> u8 {
        let step = (u32::from(percent.min(100)) * u32::from(self.max_step) + 50) / 100;
        u8::try_from(step).unwrap_or(self.max_step)
    }
}

impl ToggleCapability for VirtualLevel {
    fn read(&self) -> Result<SettingValue, CapabilityError> {
        self.faults.check_read(&self.name)?;
        Ok(SettingValue::Percent(self.to_percent(self.step())))
    }

    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError> {
        self.faults.check_write(&self.name)?;
        let percent = value
            .as_percent()
            .ok_or(CapabilityError::InvalidValue { expected: "percent" })?;
        let step = self.to_step(percent);
        self.set_step(step);
        tracing::debug!(level = %self.name, percent, step, "virtual level written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_expose_steps_as_percent() {
        let volume = VirtualLevel::new("media", 15, 15);
        assert_eq!(volume.read().unwrap(), SettingValue::Percent(100));

        volume.set_step(0);
        assert_eq!(volume.read().unwrap(), SettingValue::Percent(0));
    }

    #[test]
    fn should_round_percent_to_nearest_step() {
        let volume = VirtualLevel::new("media", 15, 0);
        volume.write(&SettingValue::Percent(80)).unwrap();
        assert_eq!(volume.step(), 12);
    }

    #[test]
    fn should_land_on_same_step_after_read_write_cycle() {
        let volume = VirtualLevel::new("media", 15, 0);
        for step in 0..=15 {
            volume.set_step(step);
            let read = volume.read().unwrap();
            volume.set_step(0);
            volume.write(&read).unwrap();
            assert_eq!(volume.step(), step);
        }
    }

    #[test]
    fn should_reject_non_percent_value() {
        let brightness = VirtualLevel::new("brightness", 100, 50);
        assert!(brightness.write(&SettingValue::Bool(true)).is_err());
        assert_eq!(brightness.step(), 50);
    }
}
