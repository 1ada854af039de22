//! Wall-clock helpers.

use chrono::{Local, NaiveDateTime};

/// Local wall-clock time, the reference frame for daily schedules.
pub type WallClock = NaiveDateTime;

/// Return the current local wall-clock time.
#[must_use]
pub fn local_now() -> WallClock {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_local_time_close_to_system_clock() {
        let before = Local::now().naive_local();
        let wall = local_now();
        let after = Local::now().naive_local();
        assert!(wall >= before);
        assert!(wall <= after);
    }
}
