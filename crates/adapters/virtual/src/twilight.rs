//! Twilight source with the same sunset and sunrise every day.

use chrono::{NaiveDate, NaiveTime};

use modekeeper_app::ports::TwilightSource;
use modekeeper_domain::schedule::Twilight;

/// [`TwilightSource`] returning fixed times, for hosts without a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTwilight(Twilight);

impl FixedTwilight {
    #[must_use]
    pub fn new(sunset: NaiveTime, sunrise: NaiveTime) -> Self {
        Self(Twilight { sunset, sunrise })
    }
}

impl TwilightSource for FixedTwilight {
    fn twilight(&self, _date: NaiveDate) -> Option<Twilight> {
        Some(self.0)
    }
}
