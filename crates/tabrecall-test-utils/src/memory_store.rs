// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory EntryStore for unit tests, with write-failure injection.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tabrecall_core::{
    AdapterType, EntryStore, HealthStatus, ServiceAdapter, TabId, TabRecord, TabrecallError,
};

/// In-memory entry store keeping both namespaces in plain maps.
///
/// `fail_next_saves(n)` makes the next `n` record writes fail with a
/// `Storage` error, for exercising the retry-once contract.
pub struct InMemoryStore {
    records: Arc<Mutex<HashMap<TabId, TabRecord>>>,
    notes: Arc<Mutex<HashMap<String, String>>>,
    failing_saves: AtomicUsize,
    save_count: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            notes: Arc::new(Mutex::new(HashMap::new())),
            failing_saves: AtomicUsize::new(0),
            save_count: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` calls to `upsert_record` fail.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    /// Number of successful record writes so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Direct read of a stored record (test assertions).
    pub async fn record(&self, tab_id: TabId) -> Option<TabRecord> {
        self.records.lock().await.get(&tab_id).cloned()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// True when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Pre-populate a record, bypassing the failure counter (test setup).
    pub async fn seed(&self, record: TabRecord) {
        self.records.lock().await.insert(record.tab_id, record);
    }

    fn take_failure(&self) -> bool {
        self.failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceAdapter for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        Ok(())
    }
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn initialize(&self) -> Result<(), TabrecallError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), TabrecallError> {
        Ok(())
    }

    async fn load_records(&self) -> Result<HashMap<TabId, TabRecord>, TabrecallError> {
        Ok(self.records.lock().await.clone())
    }

    async fn upsert_record(&self, record: &TabRecord) -> Result<(), TabrecallError> {
        if self.take_failure() {
            return Err(TabrecallError::Storage {
                source: "injected save failure".into(),
            });
        }
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .await
            .insert(record.tab_id, record.clone());
        Ok(())
    }

    async fn delete_record(&self, tab_id: TabId) -> Result<(), TabrecallError> {
        self.records.lock().await.remove(&tab_id);
        Ok(())
    }

    async fn save_note(&self, url: &str, body: &str) -> Result<(), TabrecallError> {
        self.notes
            .lock()
            .await
            .insert(url.to_string(), body.to_string());
        Ok(())
    }

    async fn get_note(&self, url: &str) -> Result<Option<String>, TabrecallError> {
        Ok(self.notes.lock().await.get(url).cloned())
    }

    async fn list_notes(&self) -> Result<Vec<(String, String)>, TabrecallError> {
        Ok(self
            .notes
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn delete_note(&self, url: &str) -> Result<(), TabrecallError> {
        self.notes.lock().await.remove(url);
        Ok(())
    }
}
