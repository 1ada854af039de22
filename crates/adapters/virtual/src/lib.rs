//! # modekeeper-adapter-virtual
//!
//! Virtual/demo adapter that provides simulated subsystems for testing and
//! demonstration purposes.
//!
//! ## Provided subsystems
//!
//! | Toggle id | Device | Value |
//! |-----------|--------|-------|
//! | `heads_up` | switch | `bool` |
//! | `zen` | switch | `bool` |
//! | `ringer` | ringer | `text` (`normal`, `vibrate`, `silent`) |
//! | `night_light` | night light | `record` (`activated`, `auto_mode`) |
//! | `battery_saver` | switch | `bool` |
//! | `bluetooth` | switch | `bool` |
//! | `three_finger` | switch | `bool` |
//! | `extra_dim` | switch | `bool` |
//! | `brightness` | level, 100 steps | `percent` |
//! | `media_volume` | level, 15 steps | `percent` |
//!
//! Also provides a tracing-backed [`NotificationSink`](modekeeper_app::ports::NotificationSink)
//! and a fixed [`TwilightSource`](modekeeper_app::ports::TwilightSource).
//!
//! ## Dependency rule
//!
//! Depends on `modekeeper-app` (port traits) and `modekeeper-domain` only.

mod devices;
mod notification;
mod twilight;

pub use devices::{
    Faults, RingerMode, VirtualLevel, VirtualNightLight, VirtualRinger, VirtualSwitch,
};
pub use notification::TracingNotificationSink;
pub use twilight::FixedTwilight;

use std::sync::Arc;

use modekeeper_app::ports::ToggleCapability;
use modekeeper_domain::error::{CapabilityError, ModeKeeperError, NotFoundError};
use modekeeper_domain::id::ToggleId;
use modekeeper_domain::value::SettingValue;

/// Wrapper enum for the concrete virtual device types.
#[derive(Clone)]
pub enum VirtualDevice {
    Switch(Arc<VirtualSwitch>),
    Level(Arc<VirtualLevel>),
    Ringer(Arc<VirtualRinger>),
    NightLight(Arc<VirtualNightLight>),
}

impl VirtualDevice {
    /// Shared handle usable as an engine capability.
    #[must_use]
    pub fn capability(&self) -> Arc<dyn ToggleCapability> {
        match self {
            Self::Switch(d) => d.clone(),
            Self::Level(d) => d.clone(),
            Self::Ringer(d) => d.clone(),
            Self::NightLight(d) => d.clone(),
        }
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        match self {
            Self::Switch(d) => d.faults(),
            Self::Level(d) => d.faults(),
            Self::Ringer(d) => d.faults(),
            Self::NightLight(d) => d.faults(),
        }
    }
}

/// Catalog of simulated subsystems keyed by toggle id.
#[derive(Clone, Default)]
pub struct VirtualSubsystems {
    devices: Vec<(ToggleId, VirtualDevice)>,
}

impl VirtualSubsystems {
    /// The subsystems listed in the crate documentation.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a built-in id is rejected.
    pub fn standard() -> Result<Self, ModeKeeperError> {
        Ok(Self::default()
            .with("heads_up", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("heads_up", true))))?
            .with("zen", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("zen", false))))?
            .with("ringer", VirtualDevice::Ringer(Arc::new(VirtualRinger::new(RingerMode::Normal))))?
            .with("night_light", VirtualDevice::NightLight(Arc::new(VirtualNightLight::new(false, 1))))?
            .with("battery_saver", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("battery_saver", false))))?
            .with("bluetooth", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("bluetooth", true))))?
            .with("three_finger", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("three_finger", true))))?
            .with("extra_dim", VirtualDevice::Switch(Arc::new(VirtualSwitch::new("extra_dim", false))))?
            .with("brightness", VirtualDevice::Level(Arc::new(VirtualLevel::new("brightness", 100, 60))))?
            .with("media_volume", VirtualDevice::Level(Arc::new(VirtualLevel::new("media_volume", 15, 8))))?)
    }

    /// Add or replace a device.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid toggle id.
    pub fn with(mut self, id: &str, device: VirtualDevice) -> Result<Self, ModeKeeperError> {
        let id = ToggleId::new(id)?;
        self.devices.retain(|(existing, _)| *existing != id);
        self.devices.push((id, device));
        Ok(self)
    }

    #[must_use]
    pub fn device(&self, id: &ToggleId) -> Option<&VirtualDevice> {
        self.devices
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, device)| device)
    }

    /// Capability for `id`, ready to register with an engine.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::NotFound`] when no device has that id.
    pub fn capability(&self, id: &ToggleId) -> Result<Arc<dyn ToggleCapability>, ModeKeeperError> {
        self.device(id)
            .map(VirtualDevice::capability)
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Subsystem",
                    id: id.to_string(),
                }
                .into()
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &ToggleId> {
        self.devices.iter().map(|(id, _)| id)
    }

    /// Current value of every device, in catalog order.
    #[must_use]
    pub fn readings(&self) -> Vec<(ToggleId, Result<SettingValue, CapabilityError>)> {
        self.devices
            .iter()
            .map(|(id, device)| (id.clone(), device.capability().read()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ToggleId {
        ToggleId::new(raw).unwrap()
    }

    #[test]
    fn should_provide_ten_standard_subsystems() {
        let subsystems = VirtualSubsystems::standard().unwrap();
        assert_eq!(subsystems.ids().count(), 10);
    }

    #[test]
    fn should_read_standard_defaults() {
        let subsystems = VirtualSubsystems::standard().unwrap();
        let readings = subsystems.readings();

        let volume = readings
            .iter()
            .find(|(toggle, _)| *toggle == id("media_volume"))
            .unwrap();
        assert_eq!(volume.1, Ok(SettingValue::Percent(53)));
    }

    #[test]
    fn should_share_state_between_capability_handles() {
        let subsystems = VirtualSubsystems::standard().unwrap();
        let first = subsystems.capability(&id("zen")).unwrap();
        let second = subsystems.capability(&id("zen")).unwrap();

        first.write(&SettingValue::Bool(true)).unwrap();

        assert_eq!(second.read().unwrap(), SettingValue::Bool(true));
    }

    #[test]
    fn should_return_not_found_for_unknown_subsystem() {
        let subsystems = VirtualSubsystems::standard().unwrap();
        let result = subsystems.capability(&id("wifi"));
        assert!(matches!(result, Err(ModeKeeperError::NotFound(_))));
    }

    #[test]
    fn should_replace_device_with_same_id() {
        let subsystems = VirtualSubsystems::standard()
            .unwrap()
            .with(
                "zen",
                VirtualDevice::Switch(Arc::new(VirtualSwitch::new("zen", true))),
            )
            .unwrap();

        assert_eq!(subsystems.ids().count(), 10);
        let zen = subsystems.capability(&id("zen")).unwrap();
        assert_eq!(zen.read().unwrap(), SettingValue::Bool(true));
    }

    #[test]
    fn should_inject_faults_through_catalog() {
        let subsystems = VirtualSubsystems::standard().unwrap();
        let device = subsystems.device(&id("brightness")).unwrap();

        device.faults().fail_reads(true);

        assert!(device.capability().read().is_err());
    }
}
