//! Typed values read from and written to subsystems.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A value a subsystem capability can read or write.
///
/// The same type carries override values (what a mode applies) and prior
/// values (what a snapshot restores). Subsystems with several coupled fields
/// use [`Record`](Self::Record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    /// Relative level in `0..=100`, e.g. media volume or brightness.
    Percent(u8),
    Text(String),
    Record(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Build a [`Percent`](Self::Percent) value, checking the range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PercentOutOfRange`] outside `0..=100`.
    pub fn percent(value: i64) -> Result<Self, ValidationError> {
        match u8::try_from(value) {
            Ok(level) if level <= 100 => Ok(Self::Percent(level)),
            _ => Err(ValidationError::PercentOutOfRange(value)),
        }
    }

    /// Build a [`Record`](Self::Record) from `(name, value)` pairs.
    #[must_use]
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: Into<String>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check value-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PercentOutOfRange`] for a percentage above
    /// 100, including inside records.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Percent(level) if *level > 100 => {
                Err(ValidationError::PercentOutOfRange(i64::from(*level)))
            }
            Self::Record(fields) => fields.values().try_for_each(Self::validate),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Percent(p) => Some(i64::from(*p)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_percent(&self) -> Option<u8> {
        match self {
            Self::Percent(p) => Some(*p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a named field of a [`Record`](Self::Record).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SettingValue> {
        match self {
            Self::Record(fields) => fields.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Text(s) => f.write_str(s),
            Self::Record(fields) => {
                f.write_str("{")?;
                for (idx, (name, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
