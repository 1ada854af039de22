//! Virtual subsystems — switch, level, ringer, night light.
//!
//! Every device keeps its value in memory and can be told to fail reads or
//! writes, which is how demos and tests exercise the engines' best-effort
//! paths.

mod level;
mod night_light;
mod ringer;
mod switch;

pub use level::VirtualLevel;
pub use night_light::VirtualNightLight;
pub use ringer::{RingerMode, VirtualRinger};
pub use switch::VirtualSwitch;

use std::sync::atomic::{AtomicBool, Ordering};

use modekeeper_domain::error::CapabilityError;

/// Failure switches shared by all virtual devices.
#[derive(Debug, Default)]
pub struct Faults {
    reads: AtomicBool,
    writes: AtomicBool,
}

impl Faults {
    /// Make every subsequent read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self, name: &str) -> Result<(), CapabilityError> {
        if self.reads.load(Ordering::SeqCst) {
            return Err(CapabilityError::read_failed(format!("{name} is not responding")));
        }
        Ok(())
    }

    fn check_write(&self, name: &str) -> Result<(), CapabilityError> {
        if self.writes.load(Ordering::SeqCst) {
            return Err(CapabilityError::write_failed(format!("{name} rejected the write")));
        }
        Ok(())
    }
}
