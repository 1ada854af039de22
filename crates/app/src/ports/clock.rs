//! Time ports — wall clock and twilight times.

use chrono::NaiveDate;

use modekeeper_domain::schedule::Twilight;
use modekeeper_domain::time::{WallClock, local_now};

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> WallClock;
}

/// [`Clock`] backed by the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallClock {
        local_now()
    }
}

/// Provides sunset and sunrise times for the night modes.
pub trait TwilightSource: Send + Sync {
    /// Twilight for `date`, or `None` when it cannot be determined
    /// (no location fix, polar day, …).
    fn twilight(&self, date: NaiveDate) -> Option<Twilight>;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> WallClock {
        (**self).now()
    }
}

impl<T: TwilightSource + ?Sized> TwilightSource for std::sync::Arc<T> {
    fn twilight(&self, date: NaiveDate) -> Option<Twilight> {
        (**self).twilight(date)
    }
}
