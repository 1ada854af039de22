//! Capability port — read/write access to one subsystem.

use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::value::SettingValue;

/// Abstract accessor for one overridable subsystem (volume, brightness, …).
///
/// Calls are synchronous and expected to be fast and local. Each capability
/// must be safe to write in isolation: the engine applies and restores
/// toggles independently, with no ordering between them.
pub trait ToggleCapability: Send + Sync {
    /// Read the subsystem's current value.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] when the subsystem cannot be queried.
    fn read(&self) -> Result<SettingValue, CapabilityError>;

    /// Apply `value` to the subsystem.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] when the write is rejected or fails.
    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError>;
}

impl<T: ToggleCapability + ?Sized> ToggleCapability for std::sync::Arc<T> {
    fn read(&self) -> Result<SettingValue, CapabilityError> {
        (**self).read()
    }

    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError> {
        (**self).write(value)
    }
}
