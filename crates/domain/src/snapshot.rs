//! Snapshot — prior subsystem values captured by the latest activation.
//!
//! Presence of a toggle id in a [`Snapshot`] is authoritative: it means the
//! toggle was overridden and must be restored. Absence means there is
//! nothing to restore for that toggle, not "restore to a default".
//!
//! Snapshots are persisted as one string entry per toggle under
//! [`SNAPSHOT_KEY_PREFIX`], next to the session markers
//! [`SESSION_ID_KEY`], [`SESSION_ACTIVE_KEY`] and [`SESSION_APPLIED_KEY`].

use crate::id::{SessionId, ToggleId};
use crate::value::SettingValue;

/// Key prefix of persisted prior values (`snapshot.<toggle id>`).
pub const SNAPSHOT_KEY_PREFIX: &str = "snapshot.";

/// Key of the persisted id of the session that wrote the snapshot.
pub const SESSION_ID_KEY: &str = "session.id";

/// Key of the persisted active marker (`1` while a session is active).
pub const SESSION_ACTIVE_KEY: &str = "session.active";

/// Key of the comma-separated ids whose override was written successfully.
///
/// A subset of the snapshot: a toggle whose override failed is still
/// restored, but is not advertised as part of the mode.
pub const SESSION_APPLIED_KEY: &str = "session.applied";

/// Prior values keyed by toggle id, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    session_id: Option<SessionId>,
    values: Vec<(ToggleId, SettingValue)>,
}

impl Snapshot {
    /// Start an empty snapshot for the given activation.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            values: Vec::new(),
        }
    }

    /// Session that captured these values, when known.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn set_session_id(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    /// Record the prior value of a toggle, replacing an earlier capture.
    pub fn insert(&mut self, id: ToggleId, value: SettingValue) {
        match self.values.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = value,
            None => self.values.push((id, value)),
        }
    }

    #[must_use]
    pub fn get(&self, id: &ToggleId) -> Option<&SettingValue> {
        self.values
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, id: &ToggleId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ToggleId, &SettingValue)> {
        self.values.iter().map(|(id, value)| (id, value))
    }

    /// Encode every prior value as a `(key, json)` pair for persistence.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a value fails to serialize.
    pub fn to_entries(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        self.values
            .iter()
            .map(|(id, value)| serde_json::to_string(value).map(|json| (entry_key(id), json)))
            .collect()
    }

    /// Decode one persisted entry and add it to the snapshot.
    ///
    /// Returns `Ok(false)` when `key` is not a snapshot entry.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotDecodeError`] when the key names an invalid toggle
    /// id or the payload is not a valid [`SettingValue`].
    pub fn insert_entry(&mut self, key: &str, payload: &str) -> Result<bool, SnapshotDecodeError> {
        let Some(raw_id) = key.strip_prefix(SNAPSHOT_KEY_PREFIX) else {
            return Ok(false);
        };
        let id = ToggleId::new(raw_id).map_err(|_| SnapshotDecodeError::Key(key.to_string()))?;
        let value: SettingValue =
            serde_json::from_str(payload).map_err(|source| SnapshotDecodeError::Value {
                key: key.to_string(),
                source,
            })?;
        self.insert(id, value);
        Ok(true)
    }
}

/// Persisted key for a toggle's prior value.
#[must_use]
pub fn entry_key(id: &ToggleId) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{id}")
}

/// A persisted snapshot entry could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotDecodeError {
    #[error("invalid snapshot key {0:?}")]
    Key(String),

    #[error("invalid snapshot value under {key:?}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ToggleId {
        ToggleId::new(raw).unwrap()
    }

    #[test]
    fn should_report_presence_only_for_captured_toggles() {
        let mut snapshot = Snapshot::new(SessionId::new());
        snapshot.insert(id("zen"), SettingValue::Bool(false));
        assert!(snapshot.contains(&id("zen")));
        assert!(!snapshot.contains(&id("media")));
    }

    #[test]
    fn should_replace_value_when_captured_twice() {
        let mut snapshot = Snapshot::default();
        snapshot.insert(id("media"), SettingValue::Percent(20));
        snapshot.insert(id("media"), SettingValue::Percent(30));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&id("media")), Some(&SettingValue::Percent(30)));
    }

    #[test]
    fn should_keep_capture_order() {
        let mut snapshot = Snapshot::default();
        snapshot.insert(id("b"), SettingValue::Int(1));
        snapshot.insert(id("a"), SettingValue::Int(2));
        let order: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn should_prefix_entry_keys() {
        assert_eq!(entry_key(&id("heads_up")), "snapshot.heads_up");
    }

    #[test]
    fn should_rebuild_snapshot_from_encoded_entries() {
        let mut original = Snapshot::new(SessionId::new());
        original.insert(id("media"), SettingValue::Percent(35));
        original.insert(
            id("night_light"),
            SettingValue::record([
                ("activated", SettingValue::Bool(true)),
                ("auto_mode", SettingValue::Int(1)),
            ]),
        );

        let mut decoded = Snapshot::default();
        for (key, payload) in original.to_entries().unwrap() {
            assert!(decoded.insert_entry(&key, &payload).unwrap());
        }
        assert_eq!(decoded.get(&id("media")), original.get(&id("media")));
        assert_eq!(
            decoded.get(&id("night_light")),
            original.get(&id("night_light"))
        );
    }

    #[test]
    fn should_ignore_non_snapshot_keys() {
        let mut snapshot = Snapshot::default();
        assert!(!snapshot.insert_entry(SESSION_ACTIVE_KEY, "1").unwrap());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn should_fail_on_corrupt_payload() {
        let mut snapshot = Snapshot::default();
        let result = snapshot.insert_entry("snapshot.media", "{not json");
        assert!(matches!(result, Err(SnapshotDecodeError::Value { .. })));
    }

    #[test]
    fn should_fail_on_invalid_key() {
        let mut snapshot = Snapshot::default();
        let result = snapshot.insert_entry("snapshot.bad key", "{\"type\":\"int\",\"value\":1}");
        assert!(matches!(result, Err(SnapshotDecodeError::Key(_))));
    }
}
