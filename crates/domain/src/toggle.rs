//! Feature toggle — one independently overridable subsystem setting.
//!
//! A toggle only *describes* the override. The capability that actually
//! reads and writes the subsystem lives behind a port in the `app` crate and
//! is registered next to the toggle in the engine.

use serde::{Deserialize, Serialize};

use crate::error::{ModeKeeperError, ValidationError};
use crate::id::ToggleId;
use crate::value::SettingValue;

/// An overridable subsystem setting and the value a mode applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggle {
    pub id: ToggleId,
    /// Human readable name, used in the active-mode indicator.
    pub label: String,
    /// Whether this toggle participates in the next activation.
    pub enabled_by_user: bool,
    pub override_value: SettingValue,
}

impl FeatureToggle {
    /// Create a builder for constructing a [`FeatureToggle`].
    #[must_use]
    pub fn builder() -> FeatureToggleBuilder {
        FeatureToggleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::Validation`] when:
    /// - `label` is empty ([`ValidationError::EmptyLabel`])
    /// - `override_value` holds an out-of-range percentage
    pub fn validate(&self) -> Result<(), ModeKeeperError> {
        if self.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        self.override_value.validate()?;
        Ok(())
    }
}

/// Step-by-step builder for [`FeatureToggle`].
#[derive(Debug, Default)]
pub struct FeatureToggleBuilder {
    id: Option<String>,
    label: Option<String>,
    enabled_by_user: Option<bool>,
    override_value: Option<SettingValue>,
}

impl FeatureToggleBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled_by_user = Some(enabled);
        self
    }

    #[must_use]
    pub fn override_value(mut self, value: SettingValue) -> Self {
        self.override_value = Some(value);
        self
    }

    /// Consume the builder, validate, and return a [`FeatureToggle`].
    ///
    /// The label defaults to the id and the toggle defaults to disabled,
    /// matching an unconfigured subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`ModeKeeperError::Validation`] if the id is missing or
    /// invalid, or if invariants fail.
    pub fn build(self) -> Result<FeatureToggle, ModeKeeperError> {
        let id = ToggleId::new(self.id.unwrap_or_default())?;
        let toggle = FeatureToggle {
            label: self.label.unwrap_or_else(|| id.to_string()),
            id,
            enabled_by_user: self.enabled_by_user.unwrap_or(false),
            override_value: self.override_value.unwrap_or(SettingValue::Bool(false)),
        };
        toggle.validate()?;
        Ok(toggle)
    }
}
