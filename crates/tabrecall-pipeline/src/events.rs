// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record-change fan-out to presentation observers.
//!
//! Every distinct field update publishes exactly one patch carrying the
//! changed fields plus full context (id, url, title) so observers can apply
//! incremental updates without re-querying.

use serde::Serialize;
use tabrecall_core::{TabId, TabRecord};
use tokio::sync::broadcast;
use tracing::trace;

/// Default buffer depth for the broadcast channel. Lagging observers drop
/// the oldest events, never block the pipeline.
const DEFAULT_CAPACITY: usize = 256;

/// A field-scoped update to one record. `None` fields did not change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPatch {
    pub tab_id: TabId,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub last_updated: i64,
}

impl RecordPatch {
    /// Patch context (id, url, title, timestamp) from a record, with no
    /// changed fields yet.
    pub fn context(record: &TabRecord) -> Self {
        Self {
            tab_id: record.tab_id,
            url: record.url.clone(),
            title: record.title.clone(),
            summary: None,
            tags: None,
            last_updated: record.last_updated,
        }
    }

    /// Marks the summary as changed.
    pub fn with_summary(mut self, summary: String) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Marks the tags as changed.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// An outward notification about one tab's derived state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecordEvent {
    /// Fields of a tracked record changed.
    RecordChanged {
        #[serde(flatten)]
        patch: RecordPatch,
    },
    /// The tab closed and its record is gone.
    RecordRemoved { tab_id: TabId },
}

/// Broadcast bus for [`RecordEvent`] fan-out.
///
/// Publishing never fails and never blocks; without subscribers events are
/// simply dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RecordEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current observers.
    pub fn publish(&self, event: RecordEvent) {
        trace!(?event, "publishing record event");
        // A send error only means there are no observers right now.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
