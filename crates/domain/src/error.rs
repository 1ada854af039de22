//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ModeKeeperError`] via `#[from]`. Capability failures are
//! *not* part of [`ModeKeeperError`]: they are aggregated into reports and
//! never abort an activation or a restore.

/// Top-level error returned by application services and engines.
#[derive(Debug, thiserror::Error)]
pub enum ModeKeeperError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The persisted store could not be read or written. Fatal to the
    /// current activate/deactivate call.
    #[error("persisted store unavailable")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("identifier {0:?} contains invalid characters")]
    InvalidId(String),

    #[error("label must not be empty")]
    EmptyLabel,

    #[error("toggle {0} is registered more than once")]
    DuplicateToggle(String),

    #[error("percentage {0} is outside 0..=100")]
    PercentOutOfRange(i64),

    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("time window is malformed")]
    Window(#[from] crate::schedule::WindowError),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure reported by a subsystem capability.
///
/// These are recorded and skipped, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The subsystem is absent or access was denied.
    #[error("capability unavailable: {reason}")]
    Unavailable { reason: String },

    /// Reading the current value failed.
    #[error("capability read failed: {reason}")]
    ReadFailed { reason: String },

    /// Writing a value failed (usually transient).
    #[error("capability write failed: {reason}")]
    WriteFailed { reason: String },

    /// The value has a shape the subsystem cannot accept.
    #[error("capability expected a {expected} value")]
    InvalidValue { expected: &'static str },
}

impl CapabilityError {
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn read_failed(reason: impl Into<String>) -> Self {
        Self::ReadFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_top_level_error() {
        let err: ModeKeeperError = ValidationError::EmptyLabel.into();
        assert!(matches!(
            err,
            ModeKeeperError::Validation(ValidationError::EmptyLabel)
        ));
    }

    #[test]
    fn should_convert_not_found_error_into_top_level_error() {
        let err: ModeKeeperError = NotFoundError {
            entity: "Toggle",
            id: "media".to_string(),
        }
        .into();
        assert!(matches!(err, ModeKeeperError::NotFound(_)));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Toggle",
            id: "media".to_string(),
        };
        assert_eq!(err.to_string(), "Toggle not found: media");
    }

    #[test]
    fn should_keep_store_error_as_source() {
        let io = std::io::Error::other("disk gone");
        let err = ModeKeeperError::StoreUnavailable(Box::new(io));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk gone");
    }

    #[test]
    fn should_display_capability_reason() {
        let err = CapabilityError::write_failed("audio service busy");
        assert_eq!(err.to_string(), "capability write failed: audio service busy");
    }
}
