//! `SQLite` implementation of [`KeyValueStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modekeeper_app::ports::{KeyValueStore, StoredValue};
use modekeeper_domain::error::{ModeKeeperError, ValidationError};

use crate::error::StorageError;

struct Wrapper(StoredValue);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let int_value: Option<i64> = row.try_get("int_value")?;
        let text_value: Option<String> = row.try_get("text_value")?;
        match (int_value, text_value) {
            (Some(value), None) => Ok(Self(StoredValue::Int(value))),
            (None, Some(value)) => Ok(Self(StoredValue::Text(value))),
            _ => Err(sqlx::Error::Decode(
                "setting row must hold exactly one value".into(),
            )),
        }
    }
}

fn split(value: &StoredValue) -> (Option<i64>, Option<&str>) {
    match value {
        StoredValue::Int(value) => (Some(*value), None),
        StoredValue::Text(value) => (None, Some(value.as_str())),
    }
}

const UPSERT: &str = "INSERT INTO settings (namespace, key, int_value, text_value) VALUES (?, ?, ?, ?) \
     ON CONFLICT (namespace, key) DO UPDATE SET \
     int_value = excluded.int_value, text_value = excluded.text_value, \
     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// `SQLite`-backed key-value store scoped to one namespace.
///
/// Several stores may share a pool; each only sees its own namespace.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteKeyValueStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    /// Like [`new`](Self::new), rejecting an empty namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyNamespace`] for a blank namespace.
    pub fn try_new(pool: SqlitePool, namespace: impl Into<String>) -> Result<Self, ModeKeeperError> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(ValidationError::EmptyNamespace.into());
        }
        Ok(Self::new(pool, namespace))
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, ModeKeeperError> {
        let row: Option<Wrapper> = sqlx::query_as(
            "SELECT int_value, text_value FROM settings WHERE namespace = ? AND key = ?",
        )
        .bind(&self.namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn put(&self, key: &str, value: &StoredValue) -> Result<(), ModeKeeperError> {
        let (int_value, text_value) = split(value);
        sqlx::query(UPSERT)
            .bind(&self.namespace)
            .bind(key)
            .bind(int_value)
            .bind(text_value)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    async fn get_int(&self, key: &str, default: i64) -> Result<i64, ModeKeeperError> {
        match self.get(key).await? {
            Some(StoredValue::Int(value)) => Ok(value),
            _ => Ok(default),
        }
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, ModeKeeperError> {
        match self.get(key).await? {
            Some(StoredValue::Text(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn put_int(&self, key: &str, value: i64) -> Result<(), ModeKeeperError> {
        self.put(key, &StoredValue::Int(value)).await
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<(), ModeKeeperError> {
        self.put(key, &StoredValue::Text(value.to_string())).await
    }

    async fn contains(&self, key: &str) -> Result<bool, ModeKeeperError> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM settings WHERE namespace = ? AND key = ?")
                .bind(&self.namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(found.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, ModeKeeperError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM settings WHERE namespace = ? ORDER BY key")
                .bind(&self.namespace)
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn clear(&self) -> Result<(), ModeKeeperError> {
        sqlx::query("DELETE FROM settings WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn replace_all(&self, entries: Vec<(String, StoredValue)>) -> Result<(), ModeKeeperError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query("DELETE FROM settings WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        for (key, value) in &entries {
            let (int_value, text_value) = split(value);
            sqlx::query(UPSERT)
                .bind(&self.namespace)
                .bind(key)
                .bind(int_value)
                .bind(text_value)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        tracing::debug!(namespace = %self.namespace, entries = entries.len(), "replaced namespace content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Config, Database};

    async fn setup() -> Database {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
        };
        config.build().await.unwrap()
    }

    #[tokio::test]
    async fn should_return_default_for_missing_int() {
        let db = setup().await;
        let store = db.store("gaming");

        assert_eq!(store.get_int("session.active", 0).await.unwrap(), 0);
        assert_eq!(store.get_string("session.id").await.unwrap(), None);
        assert!(!store.contains("session.active").await.unwrap());
    }

    #[tokio::test]
    async fn should_overwrite_existing_value() {
        let db = setup().await;
        let store = db.store("gaming");

        store.put_int("session.active", 1).await.unwrap();
        store.put_int("session.active", 0).await.unwrap();
        store.put_string("session.id", "abc").await.unwrap();

        assert_eq!(store.get_int("session.active", 7).await.unwrap(), 0);
        assert_eq!(
            store.get_string("session.id").await.unwrap(),
            Some("abc".to_string())
        );
    }

    #[tokio::test]
    async fn should_switch_value_kind_on_overwrite() {
        let db = setup().await;
        let store = db.store("gaming");

        store.put_int("key", 3).await.unwrap();
        store.put_string("key", "three").await.unwrap();

        assert_eq!(store.get_int("key", -1).await.unwrap(), -1);
        assert_eq!(
            store.get_string("key").await.unwrap(),
            Some("three".to_string())
        );
    }

    #[tokio::test]
    async fn should_isolate_namespaces() {
        let db = setup().await;
        let gaming = db.store("gaming");
        let night = db.store("night");

        gaming.put_int("session.active", 1).await.unwrap();
        night.put_int("dark.mode", 2).await.unwrap();
        gaming.clear().await.unwrap();

        assert!(gaming.keys().await.unwrap().is_empty());
        assert_eq!(night.keys().await.unwrap(), vec!["dark.mode".to_string()]);
    }

    #[tokio::test]
    async fn should_list_keys_in_order() {
        let db = setup().await;
        let store = db.store("gaming");

        store.put_string("snapshot.volume", "{}").await.unwrap();
        store.put_int("session.active", 1).await.unwrap();
        store.put_string("snapshot.brightness", "{}").await.unwrap();

        assert_eq!(
            store.keys().await.unwrap(),
            vec![
                "session.active".to_string(),
                "snapshot.brightness".to_string(),
                "snapshot.volume".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn should_replace_whole_namespace_content() {
        let db = setup().await;
        let store = db.store("gaming");
        store.put_string("snapshot.volume", "old").await.unwrap();
        store.put_string("snapshot.brightness", "old").await.unwrap();

        store
            .replace_all(vec![
                (
                    "snapshot.volume".to_string(),
                    StoredValue::Text("new".to_string()),
                ),
                ("session.active".to_string(), StoredValue::Int(1)),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.keys().await.unwrap(),
            vec!["session.active".to_string(), "snapshot.volume".to_string()]
        );
        assert_eq!(
            store.get_string("snapshot.volume").await.unwrap(),
            Some("new".to_string())
        );
    }

    #[tokio::test]
    async fn should_reject_empty_namespace() {
        let db = setup().await;

        let result = SqliteKeyValueStore::try_new(db.pool().clone(), "  ");

        assert!(matches!(result, Err(ModeKeeperError::Validation(_))));
    }

    #[tokio::test]
    async fn should_report_store_unavailable_when_pool_is_closed() {
        let db = setup().await;
        let store = db.store("gaming");
        db.pool().close().await;

        let result = store.put_int("session.active", 1).await;

        assert!(matches!(result, Err(ModeKeeperError::StoreUnavailable(_))));
    }
}
