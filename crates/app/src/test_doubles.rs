//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use modekeeper_domain::error::ModeKeeperError;

use crate::ports::{KeyValueStore, StoredValue};

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, StoredValue>>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.entries.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ModeKeeperError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ModeKeeperError::StoreUnavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(
        &self,
        key: &str,
        default: i64,
    ) -> impl Future<Output = Result<i64, ModeKeeperError>> + Send {
        let r = self.check().map(|()| match self.entries.lock().unwrap().get(key) {
            Some(StoredValue::Int(value)) => *value,
            _ => default,
        });
        async { r }
    }

    fn get_string(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, ModeKeeperError>> + Send {
        let r = self.check().map(|()| match self.entries.lock().unwrap().get(key) {
            Some(StoredValue::Text(value)) => Some(value.clone()),
            _ => None,
        });
        async { r }
    }

    fn put_int(
        &self,
        key: &str,
        value: i64,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        let r = self.check().map(|()| {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), StoredValue::Int(value));
        });
        async { r }
    }

    fn put_string(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        let r = self.check().map(|()| {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), StoredValue::Text(value.to_string()));
        });
        async { r }
    }

    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, ModeKeeperError>> + Send {
        let r = self
            .check()
            .map(|()| self.entries.lock().unwrap().contains_key(key));
        async { r }
    }

    fn keys(&self) -> impl Future<Output = Result<Vec<String>, ModeKeeperError>> + Send {
        let r = self
            .check()
            .map(|()| self.entries.lock().unwrap().keys().cloned().collect());
        async { r }
    }

    fn clear(&self) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        let r = self.check().map(|()| self.entries.lock().unwrap().clear());
        async { r }
    }

    fn replace_all(
        &self,
        entries: Vec<(String, StoredValue)>,
    ) -> impl Future<Output = Result<(), ModeKeeperError>> + Send {
        let r = self.check().map(|()| {
            *self.entries.lock().unwrap() = entries.into_iter().collect();
        });
        async { r }
    }
}
