//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engines and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod capability;
pub mod clock;
pub mod event_source;
pub mod notification;
pub mod setting;
pub mod store;

pub use capability::ToggleCapability;
pub use clock::{Clock, SystemClock, TwilightSource};
pub use event_source::{EventSource, SignalCallback, SubscriptionHandle};
pub use notification::{Indicator, NotificationSink, StopAction};
pub use setting::BinarySetting;
pub use store::{KeyValueStore, StoredValue};
