//! Schedules for a single automated binary setting.
//!
//! The desired state is a pure function of the [`AutoMode`], the persisted
//! window string, the local wall-clock time and, for the night modes, today's
//! [`Twilight`]. Anything that cannot be resolved (malformed window, unknown
//! twilight) resolves to *inactive*: the schedule fails safe, never active.

mod mode;
mod window;

pub use mode::{AutoMode, UnknownMode};
pub use window::{TimeWindow, WindowError};

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Today's sunset and sunrise in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twilight {
    pub sunset: NaiveTime,
    pub sunrise: NaiveTime,
}

/// Persisted state of an automated binary setting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutomationSetting {
    pub mode: AutoMode,
    /// Raw window string as persisted (`"HH:MM,HH:MM"`), if any.
    pub window: Option<String>,
    /// Current value of the controlled setting.
    pub active: bool,
}

impl AutomationSetting {
    /// Resolve the interval during which the setting should be active.
    ///
    /// `Ok(None)` means there is no interval: the mode is
    /// [`Disabled`](AutoMode::Disabled) or twilight is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] when the mode reads the window string and it
    /// is missing or malformed.
    pub fn effective_window(
        &self,
        twilight: Option<Twilight>,
    ) -> Result<Option<TimeWindow>, WindowError> {
        effective_window(self.mode, self.window.as_deref(), twilight)
    }

    /// Desired value of the setting at `now`; `None` when automation is off.
    #[must_use]
    pub fn desired_active(&self, now: NaiveDateTime, twilight: Option<Twilight>) -> Option<bool> {
        desired_active(self.mode, self.window.as_deref(), now, twilight)
    }

    /// Next instant at which the desired state may flip.
    #[must_use]
    pub fn next_boundary(
        &self,
        now: NaiveDateTime,
        twilight: Option<Twilight>,
    ) -> Option<NaiveDateTime> {
        self.effective_window(twilight)
            .ok()
            .flatten()
            .and_then(|window| window.next_boundary_after(now))
    }
}

/// See [`AutomationSetting::effective_window`].
///
/// # Errors
///
/// Returns [`WindowError`] for a missing or malformed window string when the
/// mode needs one.
pub fn effective_window(
    mode: AutoMode,
    window: Option<&str>,
    twilight: Option<Twilight>,
) -> Result<Option<TimeWindow>, WindowError> {
    if mode == AutoMode::Disabled {
        return Ok(None);
    }
    let stored = if mode.uses_window() {
        Some(window.unwrap_or_default().parse::<TimeWindow>()?)
    } else {
        None
    };
    let resolved = match (mode, stored) {
        (AutoMode::TimeWindow, Some(stored)) => Some(stored),
        (AutoMode::Night, _) => twilight.map(|t| TimeWindow::new(t.sunset, t.sunrise)),
        (AutoMode::SunsetToTime, Some(stored)) => {
            twilight.map(|t| TimeWindow::new(t.sunset, stored.end()))
        }
        (AutoMode::TimeToSunrise, Some(stored)) => {
            twilight.map(|t| TimeWindow::new(stored.start(), t.sunrise))
        }
        _ => None,
    };
    Ok(resolved)
}

/// Desired value of the controlled setting.
///
/// Returns `None` for [`AutoMode::Disabled`], meaning "leave it alone".
/// Every unresolvable schedule yields `Some(false)`.
#[must_use]
pub fn desired_active(
    mode: AutoMode,
    window: Option<&str>,
    now: NaiveDateTime,
    twilight: Option<Twilight>,
) -> Option<bool> {
    if mode == AutoMode::Disabled {
        return None;
    }
    let active = matches!(
        effective_window(mode, window, twilight),
        Ok(Some(resolved)) if resolved.contains(now.time())
    );
    Some(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 10).unwrap().and_time(hm(h, m))
    }

    fn twilight() -> Twilight {
        Twilight {
            sunset: hm(20, 30),
            sunrise: hm(5, 45),
        }
    }

    #[test]
    fn should_leave_setting_alone_when_disabled() {
        assert_eq!(
            desired_active(AutoMode::Disabled, Some("00:00,23:59"), at(12, 0), None),
            None
        );
    }

    #[test]
    fn should_be_active_late_evening_in_overnight_window() {
        let window = Some("22:00,06:00");
        assert_eq!(
            desired_active(AutoMode::TimeWindow, window, at(23, 0), None),
            Some(true)
        );
        assert_eq!(
            desired_active(AutoMode::TimeWindow, window, at(12, 0), None),
            Some(false)
        );
        assert_eq!(
            desired_active(AutoMode::TimeWindow, window, at(6, 0), None),
            Some(false)
        );
    }

    #[test]
    fn should_never_be_active_with_garbage_window() {
        for hour in 0..24 {
            assert_eq!(
                desired_active(AutoMode::TimeWindow, Some("garbage"), at(hour, 0), None),
                Some(false)
            );
        }
    }

    #[test]
    fn should_never_be_active_with_missing_window() {
        assert_eq!(
            desired_active(AutoMode::TimeWindow, None, at(1, 0), None),
            Some(false)
        );
    }

    #[test]
    fn should_follow_twilight_in_night_mode() {
        assert_eq!(
            desired_active(AutoMode::Night, None, at(21, 0), Some(twilight())),
            Some(true)
        );
        assert_eq!(
            desired_active(AutoMode::Night, None, at(12, 0), Some(twilight())),
            Some(false)
        );
    }

    #[test]
    fn should_be_inactive_in_night_mode_without_twilight() {
        assert_eq!(
            desired_active(AutoMode::Night, None, at(23, 0), None),
            Some(false)
        );
    }

    #[test]
    fn should_combine_sunset_with_window_end() {
        let window = Some("19:00,23:00");
        let setting = AutomationSetting {
            mode: AutoMode::SunsetToTime,
            window: window.map(str::to_string),
            active: false,
        };
        assert_eq!(
            setting.effective_window(Some(twilight())).unwrap(),
            Some(TimeWindow::new(hm(20, 30), hm(23, 0)))
        );
        assert_eq!(setting.desired_active(at(20, 0), Some(twilight())), Some(false));
        assert_eq!(setting.desired_active(at(22, 0), Some(twilight())), Some(true));
    }

    #[test]
    fn should_combine_window_start_with_sunrise() {
        let setting = AutomationSetting {
            mode: AutoMode::TimeToSunrise,
            window: Some("23:00,07:00".to_string()),
            active: false,
        };
        assert_eq!(
            setting.effective_window(Some(twilight())).unwrap(),
            Some(TimeWindow::new(hm(23, 0), hm(5, 45)))
        );
    }

    #[test]
    fn should_report_malformed_window() {
        let setting = AutomationSetting {
            mode: AutoMode::TimeWindow,
            window: Some("garbage".to_string()),
            active: true,
        };
        assert!(setting.effective_window(None).is_err());
        assert_eq!(setting.next_boundary(at(12, 0), None), None);
    }

    #[test]
    fn should_compute_next_boundary_for_time_window() {
        let setting = AutomationSetting {
            mode: AutoMode::TimeWindow,
            window: Some("22:00,06:00".to_string()),
            active: false,
        };
        assert_eq!(setting.next_boundary(at(12, 0), None), Some(at(22, 0)));
    }

    #[test]
    fn should_have_no_boundary_when_disabled() {
        let setting = AutomationSetting {
            mode: AutoMode::Disabled,
            window: Some("22:00,06:00".to_string()),
            active: false,
        };
        assert_eq!(setting.next_boundary(at(12, 0), None), None);
    }
}
