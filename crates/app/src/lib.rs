//! # modekeeper-app
//!
//! Application layer — engines and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `KeyValueStore` — persisted snapshot and setting storage
//!   - `ToggleCapability` — read/write access to one subsystem
//!   - `EventSource` — subscriptions to external signals
//!   - `NotificationSink` — the persistent "mode active" indicator
//!   - `Clock`, `TwilightSource` — time inputs for schedules
//!   - `BinarySetting` — the setting driven by a schedule
//! - Define **driving/inbound** use-case structs:
//!   - `OverrideEngine` — activate/deactivate a mode with guaranteed restore
//!   - `ScheduledAutomation` — keep a binary setting in line with its schedule
//! - Provide **in-process infrastructure** (signal bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `modekeeper-domain` only (plus `tokio` for locks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod override_engine;
pub mod ports;
pub mod scheduled_automation;
pub mod settings;
pub mod signal_bus;

#[cfg(test)]
mod test_doubles;
