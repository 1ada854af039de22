//! Virtual ringer — normal, vibrate or silent.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use modekeeper_app::ports::ToggleCapability;
use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::value::SettingValue;

use super::Faults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    Normal,
    Vibrate,
    Silent,
}

impl fmt::Display for RingerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Vibrate => f.write_str("vibrate"),
            Self::Silent => f.write_str("silent"),
        }
    }
}

impl FromStr for RingerMode {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "vibrate" => Ok(Self::Vibrate),
            "silent" => Ok(Self::Silent),
            _ => Err(CapabilityError::InvalidValue {
                expected: "ringer mode",
            }),
        }
    }
}

/// A simulated ringer, exchanged as [`SettingValue::Text`].
pub struct VirtualRinger {
    mode: Mutex<RingerMode>,
    faults: Faults,
}

impl VirtualRinger {
    #[must_use]
    pub fn new(mode: RingerMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            faults: Faults::default(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> RingerMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: RingerMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    #[must_use]
    pub fn faults(&self) -> &Faults {
        &self.faults
    }
}

impl ToggleCapability for VirtualRinger {
    fn read(&self) -> Result<SettingValue, CapabilityError> {
        self.faults.check_read("ringer")?;
        Ok(SettingValue::Text(self.mode().to_string()))
    }

    fn write(&self, value: &SettingValue) -> Result<(), CapabilityError> {
        self.faults.check_write("ringer")?;
        let mode: RingerMode = value
            .as_text()
            .ok_or(CapabilityError::InvalidValue {
                expected: "ringer mode",
            })?
            .parse()?;
        self.set_mode(mode);
        tracing::debug!(%mode, "virtual ringer written");
        Ok(())
    }
}
