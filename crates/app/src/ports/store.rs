//! Key-value store port — persisted snapshot and setting storage.
//!
//! A store instance is scoped to one owner (an engine or a setting). Keys are
//! opaque strings chosen by that owner.

use std::future::Future;

use modekeeper_domain::error::ModeKeeperError;

/// A value as written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

/// Persistent key-value storage.
///
/// Every failure is reported as [`ModeKeeperError::StoreUnavailable`].
pub trait KeyValueStore: Send + Sync {
    /// Read an integer, returning `default` when the key is absent or holds text.
    fn get_int(
        &self,
        key: &str,
        default: i64,
    ) -> impl Future<Output = Result<i64, ModeKeeperError>> + Send;

    /// Read a string, `None` when the key is absent or holds an integer.
    fn get_string(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, ModeKeeperError>> + Send;

    /// Insert or overwrite an integer.
    fn put_int(
        &self,
        key: &str,
        value: i64,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    /// Insert or overwrite a string.
    fn put_string(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    /// Whether `key` holds any value.
    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, ModeKeeperError>> + Send;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, ModeKeeperError>> + Send;

    /// Remove every key.
    fn clear(&self) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;

    /// Atomically replace the whole content with `entries`.
    ///
    /// Either every entry is visible afterwards and nothing else, or the
    /// previous content is untouched.
    fn replace_all(
        &self,
        entries: Vec<(String, StoredValue)>,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for std::sync::Arc<T> {
    fn get_int(
        &self,
        key: &str,
        default: i64,
    ) -> impl Future<Output = Result<i64, ModeKeeperError>> + Send {
        (**self).get_int(key, default)
    }

    fn get_string(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, ModeKeeperError>> + Send {
        (**self).get_string(key)
    }

    fn put_int(
        &self,
        key: &str,
        value: i64,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).put_int(key, value)
    }

    fn put_string(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).put_string(key, value)
    }

    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, ModeKeeperError>> + Send {
        (**self).contains(key)
    }

    fn keys(&self) -> impl Future<Output = Result<Vec<String>, ModeKeeperError>> + Send {
        (**self).keys()
    }

    fn clear(&self) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).clear()
    }

    fn replace_all(
        &self,
        entries: Vec<(String, StoredValue)>,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        (**self).replace_all(entries)
    }
}
