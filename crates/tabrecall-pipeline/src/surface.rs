// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pull-side query surface for presentation observers.
//!
//! Point-in-time snapshots only; incremental updates arrive through the
//! event bus.

use std::collections::HashMap;
use std::sync::Arc;

use tabrecall_core::{AiBackend, TabId, TabRecord};
use tracing::warn;

use crate::cache::RecordCache;

/// Read-only query API over the record cache.
pub struct QuerySurface {
    cache: Arc<RecordCache>,
    backend: Arc<dyn AiBackend>,
}

impl QuerySurface {
    pub fn new(cache: Arc<RecordCache>, backend: Arc<dyn AiBackend>) -> Self {
        Self { cache, backend }
    }

    /// All tracked records, most recently updated first.
    pub async fn list_records(&self) -> Vec<TabRecord> {
        self.cache.sorted_by_recency().await
    }

    /// Records ranked by relevance to `query`, best match first.
    ///
    /// Best-effort: an empty or whitespace query degrades to a plain
    /// listing, and a backend failure yields an empty result rather than an
    /// error.
    pub async fn search(&self, query: &str) -> Vec<TabRecord> {
        let records = self.cache.sorted_by_recency().await;
        if records.is_empty() || query.trim().is_empty() {
            return records;
        }

        match self.backend.rank(query, &records).await {
            Ok(ranked_ids) => {
                let mut by_id: HashMap<TabId, TabRecord> =
                    records.into_iter().map(|r| (r.tab_id, r)).collect();
                ranked_ids
                    .into_iter()
                    .filter_map(|id| by_id.remove(&id))
                    .collect()
            }
            Err(e) => {
                warn!(error = %e, "record ranking failed, returning no matches");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabrecall_core::CapturedContent;
    use tabrecall_test_utils::{FailureMode, MockBackend};

    async fn seeded_surface(backend: Arc<MockBackend>) -> (QuerySurface, Arc<RecordCache>) {
        let cache = Arc::new(RecordCache::new());
        for (id, url) in [(1, "https://a"), (2, "https://b"), (3, "https://c")] {
            cache
                .ingest_capture(
                    TabId(id),
                    &CapturedContent {
                        url: url.to_string(),
                        title: format!("Page {id}"),
                        body_text: "text".to_string(),
                    },
                )
                .await;
        }
        (QuerySurface::new(cache.clone(), backend), cache)
    }

    #[tokio::test]
    async fn list_is_ordered_by_recency() {
        let (surface, cache) = seeded_surface(Arc::new(MockBackend::new())).await;
        cache.modify(TabId(1), |_| ()).await;

        let listed = surface.list_records().await;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].tab_id, TabId(1));
    }

    #[tokio::test]
    async fn search_preserves_backend_rank_order() {
        let backend = Arc::new(MockBackend::new());
        let (surface, cache) = seeded_surface(backend).await;
        // Recency order is 3, 2, 1; the mock ranks in given order, so the
        // result mirrors the listing.
        cache.modify(TabId(2), |_| ()).await;

        let results = surface.search("anything").await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].tab_id, TabId(2));
    }

    #[tokio::test]
    async fn search_failure_returns_empty_not_error() {
        let backend = Arc::new(MockBackend::new());
        backend.set_failure_mode(FailureMode::Execution).await;
        let (surface, _cache) = seeded_surface(backend).await;

        let results = surface.search("anything").await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn empty_query_degrades_to_listing() {
        let backend = Arc::new(MockBackend::new());
        let (surface, _cache) = seeded_surface(backend.clone()).await;

        let results = surface.search("   ").await;
        assert_eq!(results.len(), 3);
        assert_eq!(backend.rank_calls(), 0);
    }

    #[tokio::test]
    async fn search_on_empty_cache_is_empty() {
        let cache = Arc::new(RecordCache::new());
        let surface = QuerySurface::new(cache, Arc::new(MockBackend::new()));
        assert!(surface.search("query").await.is_empty());
    }
}
