//! Indicator that logs through `tracing` and remembers what is shown.

use std::sync::{Mutex, PoisonError};

use modekeeper_app::ports::{Indicator, NotificationSink};

/// [`NotificationSink`] for headless runs.
///
/// The current indicator is kept so that a console can offer its stop
/// action, the way a notification button would.
#[derive(Default)]
pub struct TracingNotificationSink {
    current: Mutex<Option<Indicator>>,
}

impl TracingNotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The indicator currently shown, if any.
    #[must_use]
    pub fn current(&self) -> Option<Indicator> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Press the stop action of the shown indicator.
    ///
    /// Returns `false` when nothing is shown.
    pub fn press_stop(&self) -> bool {
        match self.current() {
            Some(indicator) => {
                indicator.stop.trigger();
                true
            }
            None => false,
        }
    }
}

impl NotificationSink for TracingNotificationSink {
    fn show(&self, indicator: Indicator) {
        tracing::info!(title = %indicator.title, summary = %indicator.summary, "indicator shown");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(indicator);
    }

    fn dismiss(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(indicator) = previous {
            tracing::info!(title = %indicator.title, "indicator dismissed");
        }
    }
}
