//! Daily time window, possibly spanning midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const TIME_FORMAT: &str = "%H:%M";

/// A recurring daily interval `[start, end)` in local wall-clock time.
///
/// `start > end` wraps midnight. `start == end` is a zero-length window that
/// is never active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    #[must_use]
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `time` falls inside the window (start inclusive, end exclusive).
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.is_empty() {
            false
        } else if self.wraps_midnight() {
            time >= self.start || time < self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    /// The first window edge strictly after `now`.
    ///
    /// Returns `None` for an empty window, which has no edges worth waking for.
    #[must_use]
    pub fn next_boundary_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.is_empty() {
            return None;
        }
        [self.start, self.end]
            .into_iter()
            .filter_map(|edge| {
                let today = now.date().and_time(edge);
                if today > now {
                    Some(today)
                } else {
                    today.checked_add_days(Days::new(1))
                }
            })
            .min()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

/// The persisted window string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time window {input:?}, expected \"HH:MM,HH:MM\"")]
pub struct WindowError {
    pub input: String,
}

impl FromStr for TimeWindow {
    type Err = WindowError;

    /// Parse the persisted `"HH:MM,HH:MM"` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WindowError {
            input: s.to_string(),
        };
        let (start, end) = s.split_once(',').ok_or_else(malformed)?;
        let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT).map_err(|_| malformed())?;
        let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT).map_err(|_| malformed())?;
        Ok(Self::new(start, end))
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = WindowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}
