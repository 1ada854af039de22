//! In-process signal bus with filtered callback subscriptions.

use std::sync::{Mutex, PoisonError};

use modekeeper_domain::signal::{Signal, SignalFilter};

use crate::ports::{EventSource, SignalCallback, SubscriptionHandle};

struct Subscriber {
    handle: SubscriptionHandle,
    filter: SignalFilter,
    callback: SignalCallback,
}

/// In-process [`EventSource`] that fans signals out to matching callbacks.
///
/// Emitting succeeds even when nobody listens (the signal is simply dropped).
/// Callbacks are invoked outside the internal lock, so a callback may itself
/// subscribe or unsubscribe.
#[derive(Default)]
pub struct SignalBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SignalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `signal` to every matching subscriber.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, signal: &Signal) -> usize {
        let matching: Vec<SignalCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|sub| sub.filter.matches(signal))
            .map(|sub| sub.callback.clone())
            .collect();
        tracing::trace!(%signal, receivers = matching.len(), "emitting signal");
        for callback in &matching {
            callback(signal);
        }
        matching.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventSource for SignalBus {
    fn subscribe(&self, filter: SignalFilter, callback: SignalCallback) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                handle,
                filter,
                callback,
            });
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|sub| sub.handle != handle);
    }
}
