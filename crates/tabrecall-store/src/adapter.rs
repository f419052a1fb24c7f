// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the EntryStore trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use tabrecall_config::model::StorageConfig;
use tabrecall_core::{
    AdapterType, EntryStore, HealthStatus, ServiceAdapter, TabId, TabRecord, TabrecallError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed entry store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`EntryStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, TabrecallError> {
        self.db.get().ok_or_else(|| TabrecallError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ServiceAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for SqliteStore {
    async fn initialize(&self) -> Result<(), TabrecallError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TabrecallError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite entry store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TabrecallError> {
        self.db()?.close().await
    }

    async fn load_records(&self) -> Result<HashMap<TabId, TabRecord>, TabrecallError> {
        queries::records::load_all_records(self.db()?).await
    }

    async fn upsert_record(&self, record: &TabRecord) -> Result<(), TabrecallError> {
        queries::records::upsert_record(self.db()?, record).await
    }

    async fn delete_record(&self, tab_id: TabId) -> Result<(), TabrecallError> {
        queries::records::delete_record(self.db()?, tab_id).await
    }

    async fn save_note(&self, url: &str, body: &str) -> Result<(), TabrecallError> {
        queries::notes::save_note(self.db()?, url, body).await
    }

    async fn get_note(&self, url: &str) -> Result<Option<String>, TabrecallError> {
        queries::notes::get_note(self.db()?, url).await
    }

    async fn list_notes(&self) -> Result<Vec<(String, String)>, TabrecallError> {
        queries::notes::list_notes(self.db()?).await
    }

    async fn delete_note(&self, url: &str) -> Result<(), TabrecallError> {
        queries::notes::delete_note(self.db()?, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn make_record(tab_id: i64) -> TabRecord {
        TabRecord::new(
            TabId(tab_id),
            format!("https://example.com/{tab_id}"),
            format!("Tab {tab_id}"),
            "Body text long enough to matter.".to_string(),
        )
    }

    #[tokio::test]
    async fn implements_service_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert!(store.load_records().await.is_err());
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn full_record_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        // Fresh install: empty map.
        assert!(store.load_records().await.unwrap().is_empty());

        let mut record = make_record(1);
        store.upsert_record(&record).await.unwrap();

        record.summary = "A generated summary.".to_string();
        record.touch();
        store.upsert_record(&record).await.unwrap();

        let loaded = store.load_records().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&TabId(1)).unwrap().summary, "A generated summary.");

        store.delete_record(TabId(1)).await.unwrap();
        assert!(store.load_records().await.unwrap().is_empty());

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("restart.db");
        let path = db_path.to_str().unwrap();

        {
            let store = SqliteStore::new(make_config(path));
            store.initialize().await.unwrap();
            store.upsert_record(&make_record(11)).await.unwrap();
            store.upsert_record(&make_record(12)).await.unwrap();
            store.shutdown().await.unwrap();
        }

        // Cold start from the same file sees the last successful saves.
        let store = SqliteStore::new(make_config(path));
        store.initialize().await.unwrap();
        let loaded = store.load_records().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains_key(&TabId(11)));
        assert!(loaded.contains_key(&TabId(12)));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn notes_namespace_is_independent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("notes.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        store
            .save_note("https://example.com/a", "remember this page")
            .await
            .unwrap();
        store.upsert_record(&make_record(1)).await.unwrap();

        // Deleting the record leaves the note untouched.
        store.delete_record(TabId(1)).await.unwrap();
        assert_eq!(
            store.get_note("https://example.com/a").await.unwrap().as_deref(),
            Some("remember this page")
        );
        assert_eq!(store.list_notes().await.unwrap().len(), 1);

        store.delete_note("https://example.com/a").await.unwrap();
        assert!(store.list_notes().await.unwrap().is_empty());

        store.close().await.unwrap();
    }
}
