// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory record cache with keyed read-modify-write operations.
//!
//! The cache is the one piece of shared state between the pipeline and the
//! reconciler. Every mutation goes through a closure applied under the write
//! lock to the *current* record, so a concurrent pipeline run can never
//! clobber fields written by another run from a stale snapshot.

use std::collections::HashMap;

use tabrecall_core::types::SUMMARY_PENDING;
use tabrecall_core::{CapturedContent, TabId, TabRecord};
use tokio::sync::RwLock;

/// Shared cache of all tracked tab records.
#[derive(Default)]
pub struct RecordCache {
    inner: RwLock<HashMap<TabId, TabRecord>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache with persisted state (cold-start restore).
    pub async fn replace_all(&self, records: HashMap<TabId, TabRecord>) {
        *self.inner.write().await = records;
    }

    /// Returns a clone of the record for a tab, if tracked.
    pub async fn get(&self, tab_id: TabId) -> Option<TabRecord> {
        self.inner.read().await.get(&tab_id).cloned()
    }

    /// Ingests a fresh capture for a tab, creating the record if needed.
    ///
    /// Resets summary to the pending placeholder and clears tags: a new
    /// capture invalidates everything derived from the previous text. Bumps
    /// the capture generation so completions of older runs become no-ops.
    /// Returns a snapshot of the record as written.
    pub async fn ingest_capture(&self, tab_id: TabId, content: &CapturedContent) -> TabRecord {
        let mut guard = self.inner.write().await;
        let record = guard.entry(tab_id).or_insert_with(|| {
            TabRecord::new(
                tab_id,
                content.url.clone(),
                content.title.clone(),
                content.body_text.clone(),
            )
        });
        record.url = content.url.clone();
        record.title = content.title.clone();
        record.raw_text = content.body_text.clone();
        record.summary = SUMMARY_PENDING.to_string();
        record.tags.clear();
        record.capture_gen += 1;
        record.touch();
        record.clone()
    }

    /// Applies `f` to the current record under the write lock, then bumps
    /// `last_updated`. Returns the record as written, or `None` when the tab
    /// is no longer tracked (closed mid-pipeline): the benign
    /// write-after-delete race.
    pub async fn modify(
        &self,
        tab_id: TabId,
        f: impl FnOnce(&mut TabRecord),
    ) -> Option<TabRecord> {
        let mut guard = self.inner.write().await;
        let record = guard.get_mut(&tab_id)?;
        f(record);
        record.touch();
        Some(record.clone())
    }

    /// Like [`modify`](Self::modify), but only while the record's capture
    /// generation still matches `generation`. A mismatch means a newer
    /// capture superseded the run that produced this write; the write is
    /// dropped and `None` returned.
    pub async fn modify_if_current(
        &self,
        tab_id: TabId,
        generation: u64,
        f: impl FnOnce(&mut TabRecord),
    ) -> Option<TabRecord> {
        let mut guard = self.inner.write().await;
        let record = guard.get_mut(&tab_id)?;
        if record.capture_gen != generation {
            return None;
        }
        f(record);
        record.touch();
        Some(record.clone())
    }

    /// Removes and returns the record for a closed tab.
    pub async fn remove(&self, tab_id: TabId) -> Option<TabRecord> {
        self.inner.write().await.remove(&tab_id)
    }

    /// All records, most recently updated first.
    pub async fn sorted_by_recency(&self) -> Vec<TabRecord> {
        let mut records: Vec<TabRecord> = self.inner.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        records
    }

    /// Number of tracked records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True when no tabs are tracked.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Truncate to at most `max_chars` characters, respecting char boundaries.
///
/// This is a hard input cap for the backend, not a quality heuristic.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(url: &str, body: &str) -> CapturedContent {
        CapturedContent {
            url: url.to_string(),
            title: "Title".to_string(),
            body_text: body.to_string(),
        }
    }

    #[tokio::test]
    async fn ingest_creates_then_updates() {
        let cache = RecordCache::new();
        let first = cache.ingest_capture(TabId(1), &content("https://a", "one")).await;
        assert_eq!(first.capture_gen, 1);
        assert_eq!(first.summary, SUMMARY_PENDING);

        let second = cache.ingest_capture(TabId(1), &content("https://b", "two")).await;
        assert_eq!(second.capture_gen, 2);
        assert_eq!(second.url, "https://b");
        assert_eq!(second.raw_text, "two");
        assert!(second.last_updated > first.last_updated);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn ingest_resets_derived_fields() {
        let cache = RecordCache::new();
        cache.ingest_capture(TabId(1), &content("https://a", "one")).await;
        cache
            .modify(TabId(1), |r| {
                r.summary = "old summary".to_string();
                r.tags = vec!["News".to_string()];
            })
            .await
            .unwrap();

        let fresh = cache.ingest_capture(TabId(1), &content("https://a", "two")).await;
        assert_eq!(fresh.summary, SUMMARY_PENDING);
        assert!(fresh.tags.is_empty());
    }

    #[tokio::test]
    async fn modify_vanished_record_is_noop() {
        let cache = RecordCache::new();
        let result = cache.modify(TabId(99), |r| r.summary = "x".to_string()).await;
        assert!(result.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn stale_generation_write_is_dropped() {
        let cache = RecordCache::new();
        let snapshot = cache.ingest_capture(TabId(1), &content("https://a", "one")).await;
        // A newer capture arrives while the old run is still in flight.
        cache.ingest_capture(TabId(1), &content("https://a", "two")).await;

        let result = cache
            .modify_if_current(TabId(1), snapshot.capture_gen, |r| {
                r.summary = "summary of one".to_string();
            })
            .await;
        assert!(result.is_none());

        let current = cache.get(TabId(1)).await.unwrap();
        assert_eq!(current.summary, SUMMARY_PENDING);
        assert_eq!(current.raw_text, "two");
    }

    #[tokio::test]
    async fn modify_bumps_last_updated() {
        let cache = RecordCache::new();
        let before = cache.ingest_capture(TabId(1), &content("https://a", "one")).await;
        cache.modify(TabId(1), |r| r.title = "New".to_string()).await;
        let after = cache.get(TabId(1)).await.unwrap();
        assert!(after.last_updated > before.last_updated);
    }

    #[tokio::test]
    async fn concurrent_field_writes_both_land() {
        // Two interleaved read-modify-write updates to different fields of
        // the same record never lose each other's write.
        let cache = std::sync::Arc::new(RecordCache::new());
        cache.ingest_capture(TabId(1), &content("https://a", "one")).await;

        let c1 = cache.clone();
        let c2 = cache.clone();
        let t1 = tokio::spawn(async move {
            c1.modify(TabId(1), |r| r.summary = "summary".to_string()).await
        });
        let t2 = tokio::spawn(async move {
            c2.modify(TabId(1), |r| r.tags = vec!["News".to_string()]).await
        });
        t1.await.unwrap();
        t2.await.unwrap();

        let record = cache.get(TabId(1)).await.unwrap();
        assert_eq!(record.summary, "summary");
        assert_eq!(record.tags, vec!["News".to_string()]);
    }

    #[tokio::test]
    async fn sorted_by_recency_orders_descending() {
        let cache = RecordCache::new();
        cache.ingest_capture(TabId(1), &content("https://a", "a")).await;
        cache.ingest_capture(TabId(2), &content("https://b", "b")).await;
        cache.ingest_capture(TabId(3), &content("https://c", "c")).await;
        // Touch tab 1 last so it becomes the most recent.
        cache.modify(TabId(1), |_| ()).await;

        let sorted = cache.sorted_by_recency().await;
        assert_eq!(sorted[0].tab_id, TabId(1));
        assert!(sorted[0].last_updated >= sorted[1].last_updated);
        assert!(sorted[1].last_updated >= sorted[2].last_updated);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte characters are never split.
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語");
    }
}
