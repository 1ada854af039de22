//! Notification port — the persistent indicator shown while a mode is active.

use std::fmt;
use std::sync::Arc;

/// Affordance attached to the indicator that ends the active mode.
#[derive(Clone)]
pub struct StopAction(Arc<dyn Fn() + Send + Sync>);

impl StopAction {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(action))
    }

    /// Request deactivation. Safe to call any number of times.
    pub fn trigger(&self) {
        (self.0)();
    }
}

impl fmt::Debug for StopAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StopAction")
    }
}

/// Content of the persistent indicator.
#[derive(Debug, Clone)]
pub struct Indicator {
    /// Name of the active mode.
    pub title: String,
    /// Comma separated labels of the toggles that were applied.
    pub summary: String,
    pub stop: StopAction,
}

/// Displays and withdraws the persistent indicator.
pub trait NotificationSink: Send + Sync {
    /// Show or replace the indicator.
    fn show(&self, indicator: Indicator);

    /// Withdraw the indicator. No-op when nothing is shown.
    fn dismiss(&self);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn show(&self, indicator: Indicator) {
        (**self).show(indicator);
    }

    fn dismiss(&self) {
        (**self).dismiss();
    }
}
