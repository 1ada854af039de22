//! # modekeeper-domain
//!
//! Pure domain model for the modekeeper override system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, wall-clock time
//! - Define **Toggles** (independently overridable subsystem settings)
//! - Define **Setting values** (what a subsystem reads and writes)
//! - Define **Snapshots** (prior values captured by the latest activation)
//! - Define **Sessions** and **Revert triggers** (when an override ends)
//! - Define **Signals** (external notifications the engines react to)
//! - Define **Schedules** (automation modes, daily time windows, twilight)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod schedule;
pub mod session;
pub mod signal;
pub mod snapshot;
pub mod toggle;
pub mod trigger;
pub mod value;
