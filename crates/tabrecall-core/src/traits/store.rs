// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry store trait for persistence backends (SQLite, in-memory, ...).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TabrecallError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{TabId, TabRecord};

/// Adapter for the persisted tab-record mapping and the independent
/// URL-keyed page-notes mapping.
///
/// Writes are per-record so concurrent updates for different tabs never
/// clobber each other. A completed write is durable before the next load
/// from the same process; failures surface as `Storage` errors, never
/// silently.
#[async_trait]
pub trait EntryStore: ServiceAdapter {
    /// Initializes the storage backend (migrations, connections, ...).
    async fn initialize(&self) -> Result<(), TabrecallError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TabrecallError>;

    /// Loads every persisted record. Empty map on a fresh install.
    async fn load_records(&self) -> Result<HashMap<TabId, TabRecord>, TabrecallError>;

    /// Inserts or replaces the record for its tab id.
    async fn upsert_record(&self, record: &TabRecord) -> Result<(), TabrecallError>;

    /// Removes the record for the given tab id. Missing keys are a no-op.
    async fn delete_record(&self, tab_id: TabId) -> Result<(), TabrecallError>;

    // --- Page notes (independent namespace, keyed by URL) ---

    /// Inserts or replaces the note for a page URL.
    async fn save_note(&self, url: &str, body: &str) -> Result<(), TabrecallError>;

    /// Returns the note for a page URL, if any.
    async fn get_note(&self, url: &str) -> Result<Option<String>, TabrecallError>;

    /// Lists all notes as `(url, body)` pairs.
    async fn list_notes(&self) -> Result<Vec<(String, String)>, TabrecallError>;

    /// Removes the note for a page URL. Missing keys are a no-op.
    async fn delete_note(&self, url: &str) -> Result<(), TabrecallError>;
}
