//! Outcome reports of activate and deactivate calls.
//!
//! Capability failures never abort an engine call. They end up here instead.

use modekeeper_domain::error::CapabilityError;
use modekeeper_domain::id::{SessionId, ToggleId};
use modekeeper_domain::session::RevertReason;

/// One toggle whose capability failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleFailure {
    pub toggle: ToggleId,
    pub error: CapabilityError,
}

/// Result of [`OverrideEngine::activate`](super::OverrideEngine::activate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Session started by this call, `None` when the mode was already active.
    pub session: Option<SessionId>,
    /// Toggles whose override was written.
    pub applied: Vec<ToggleId>,
    /// Enabled toggles that could not be read and were left untouched.
    pub skipped: Vec<ToggleFailure>,
    /// Captured toggles whose override write failed.
    pub failed: Vec<ToggleFailure>,
}

impl ActivationReport {
    pub(crate) fn started(session: SessionId) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    /// Whether the call found the mode already active and did nothing.
    #[must_use]
    pub fn was_noop(&self) -> bool {
        self.session.is_none()
    }

    /// Whether every enabled toggle was captured and overridden.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Result of [`OverrideEngine::deactivate`](super::OverrideEngine::deactivate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Session ended by this call, `None` when the mode was already inactive.
    pub session: Option<SessionId>,
    /// What requested the deactivation, `None` for a direct call.
    pub reason: Option<RevertReason>,
    /// Toggles whose prior value was written back.
    pub restored: Vec<ToggleId>,
    pub failed: Vec<ToggleFailure>,
    /// Snapshot entries with no registered toggle.
    pub orphaned: Vec<ToggleId>,
}

impl RestoreReport {
    #[must_use]
    pub fn was_noop(&self) -> bool {
        self.session.is_none()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.orphaned.is_empty()
    }
}
