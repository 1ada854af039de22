//! Event source port — subscriptions to external signals.

use std::sync::Arc;

use modekeeper_domain::id::SubscriptionId;
use modekeeper_domain::signal::{Signal, SignalFilter};

/// Callback invoked for every matching [`Signal`].
///
/// Callbacks run on the emitter's thread and must not block; engines use
/// them only to enqueue work.
pub type SignalCallback = Arc<dyn Fn(&Signal) + Send + Sync>;

/// Opaque token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(SubscriptionId);

impl SubscriptionHandle {
    /// Mint a fresh handle. Intended for [`EventSource`] implementations.
    #[must_use]
    pub fn new() -> Self {
        Self(SubscriptionId::new())
    }

    #[must_use]
    pub fn id(self) -> SubscriptionId {
        self.0
    }
}

impl Default for SubscriptionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivers external signals to subscribers.
pub trait EventSource: Send + Sync {
    /// Register `callback` for signals matching `filter`.
    fn subscribe(&self, filter: SignalFilter, callback: SignalCallback) -> SubscriptionHandle;

    /// Remove a subscription. Unknown or already removed handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn subscribe(&self, filter: SignalFilter, callback: SignalCallback) -> SubscriptionHandle {
        (**self).subscribe(filter, callback)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        (**self).unsubscribe(handle);
    }
}
