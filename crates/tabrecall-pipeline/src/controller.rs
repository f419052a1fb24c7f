// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tab summary pipeline.
//!
//! One trigger runs "store raw text -> summarize -> publish -> classify ->
//! publish". Summary and tags are two independent tasks joined only at the
//! record: each writes its own field through a guarded read-modify-write, so
//! re-entrant triggers and closed tabs can never corrupt a record.
//!
//! Backend failures never escape as faults; they become sentinel field
//! values so every record stays renderable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tabrecall_core::types::{
    SUMMARY_FAILED, SUMMARY_INSUFFICIENT, SUMMARY_MODEL_PENDING, TAG_UNCATEGORIZED,
};
use tabrecall_core::{AiBackend, CapturedContent, EntryStore, TabId, TabrecallError};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::cache::{RecordCache, truncate_chars};
use crate::events::{EventBus, RecordEvent, RecordPatch};
use crate::gate::BackendGate;

/// Tunables for the summary pipeline, derived from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Minimum trimmed content length before the backend is consulted.
    pub min_content_chars: usize,
    /// Hard cap on backend input length, in characters.
    pub max_input_chars: usize,
    /// Deadline per backend request; expiry counts as a backend failure.
    pub request_timeout: Duration,
    /// Backend requests allowed in flight at once.
    pub max_concurrent_requests: usize,
}

impl PipelineSettings {
    /// Builds settings from the loaded daemon configuration.
    pub fn from_config(config: &tabrecall_config::TabrecallConfig) -> Self {
        Self {
            min_content_chars: config.pipeline.min_content_chars,
            max_input_chars: config.pipeline.max_input_chars,
            request_timeout: Duration::from_secs(config.backend.request_timeout_secs),
            max_concurrent_requests: config.backend.max_concurrent_requests,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&tabrecall_config::TabrecallConfig::default())
    }
}

/// Orchestrates summary and tag generation for tracked tabs.
#[derive(Clone)]
pub struct SummaryPipeline {
    cache: Arc<RecordCache>,
    store: Arc<dyn EntryStore>,
    backend: Arc<dyn AiBackend>,
    gate: BackendGate,
    bus: EventBus,
    /// Serializes backend requests; local models rarely support more than
    /// one session.
    permits: Arc<Semaphore>,
    settings: Arc<PipelineSettings>,
}

impl SummaryPipeline {
    pub fn new(
        cache: Arc<RecordCache>,
        store: Arc<dyn EntryStore>,
        backend: Arc<dyn AiBackend>,
        gate: BackendGate,
        bus: EventBus,
        settings: PipelineSettings,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1)));
        Self {
            cache,
            store,
            backend,
            gate,
            bus,
            permits,
            settings: Arc::new(settings),
        }
    }

    /// Runs the pipeline for one captured page.
    ///
    /// Safe without preconditions: creates the record when missing and
    /// tolerates concurrent calls for the same tab (the newest capture
    /// generation wins; completions of superseded runs are dropped).
    ///
    /// Resolves once the summary has settled (generated value or sentinel).
    /// Tag generation continues in a background task and publishes its own
    /// patch when done.
    pub async fn process_tab(
        &self,
        tab_id: TabId,
        content: CapturedContent,
    ) -> Result<(), TabrecallError> {
        let snapshot = self.cache.ingest_capture(tab_id, &content).await;
        let generation = snapshot.capture_gen;
        debug!(%tab_id, url = %snapshot.url, generation, "pipeline triggered");
        self.persist_current(tab_id).await?;

        let trimmed_chars = content.body_text.trim().chars().count();
        if trimmed_chars < self.settings.min_content_chars {
            debug!(%tab_id, chars = trimmed_chars, "content below threshold, skipping backend");
            self.apply_summary(tab_id, generation, SUMMARY_INSUFFICIENT.to_string())
                .await;
            return Ok(());
        }

        if !self.gate.is_ready() {
            debug!(%tab_id, "backend not ready, keeping raw text for catch-up");
            self.apply_summary(tab_id, generation, SUMMARY_MODEL_PENDING.to_string())
                .await;
            return Ok(());
        }

        let input = truncate_chars(&content.body_text, self.settings.max_input_chars);
        match self.backend_call(self.backend.summarize(input)).await {
            Ok(summary) => {
                info!(%tab_id, "summary generated");
                self.apply_summary(tab_id, generation, summary.clone()).await;
                self.spawn_classify(tab_id, generation, summary);
            }
            Err(e) => {
                warn!(%tab_id, error = %e, "summary generation failed, applying fallback values");
                self.apply_failure(tab_id, generation).await;
            }
        }

        Ok(())
    }

    /// Acquires a backend permit and runs `fut` under the request deadline.
    async fn backend_call<T>(
        &self,
        fut: impl Future<Output = Result<T, TabrecallError>>,
    ) -> Result<T, TabrecallError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TabrecallError::Internal("backend permit pool closed".into()))?;
        match tokio::time::timeout(self.settings.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TabrecallError::Timeout {
                duration: self.settings.request_timeout,
            }),
        }
    }

    /// Writes the summary field (generation-guarded), persists, and
    /// publishes a summary-only patch.
    async fn apply_summary(&self, tab_id: TabId, generation: u64, summary: String) {
        let Some(record) = self
            .cache
            .modify_if_current(tab_id, generation, |r| r.summary = summary)
            .await
        else {
            debug!(%tab_id, generation, "summary write dropped: record gone or superseded");
            return;
        };
        if let Err(e) = self.persist_current(tab_id).await {
            error!(%tab_id, error = %e, "failed to persist summary");
        }
        self.bus.publish(RecordEvent::RecordChanged {
            patch: RecordPatch::context(&record).with_summary(record.summary.clone()),
        });
    }

    /// Writes the tags field (generation-guarded), persists, and publishes
    /// a tags-only patch.
    async fn apply_tags(&self, tab_id: TabId, generation: u64, tags: Vec<String>) {
        let Some(record) = self
            .cache
            .modify_if_current(tab_id, generation, |r| r.tags = tags)
            .await
        else {
            debug!(%tab_id, generation, "tags write dropped: record gone or superseded");
            return;
        };
        if let Err(e) = self.persist_current(tab_id).await {
            error!(%tab_id, error = %e, "failed to persist tags");
        }
        self.bus.publish(RecordEvent::RecordChanged {
            patch: RecordPatch::context(&record).with_tags(record.tags.clone()),
        });
    }

    /// Terminal failure for this trigger: failure sentinel plus fallback
    /// tag in a single update and a single combined patch. Never retried
    /// automatically.
    async fn apply_failure(&self, tab_id: TabId, generation: u64) {
        let Some(record) = self
            .cache
            .modify_if_current(tab_id, generation, |r| {
                r.summary = SUMMARY_FAILED.to_string();
                r.tags = vec![TAG_UNCATEGORIZED.to_string()];
            })
            .await
        else {
            debug!(%tab_id, generation, "failure write dropped: record gone or superseded");
            return;
        };
        if let Err(e) = self.persist_current(tab_id).await {
            error!(%tab_id, error = %e, "failed to persist fallback values");
        }
        self.bus.publish(RecordEvent::RecordChanged {
            patch: RecordPatch::context(&record)
                .with_summary(record.summary.clone())
                .with_tags(record.tags.clone()),
        });
    }

    /// Fires the independent tag-generation task. Does not block the
    /// summary path; classification failure falls back to "Uncategorized".
    fn spawn_classify(&self, tab_id: TabId, generation: u64, summary: String) {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let tags = match pipeline
                .backend_call(pipeline.backend.classify(&summary))
                .await
            {
                Ok(label) => vec![label],
                Err(e) => {
                    warn!(%tab_id, error = %e, "tag generation failed, applying fallback");
                    vec![TAG_UNCATEGORIZED.to_string()]
                }
            };
            pipeline.apply_tags(tab_id, generation, tags).await;
        });
    }

    /// Persists the current record for a tab, retrying once on failure.
    ///
    /// Re-reads the cache before each attempt so a concurrent field update
    /// is never overwritten with a stale snapshot. A vanished record means
    /// the tab closed: nothing to persist.
    async fn persist_current(&self, tab_id: TabId) -> Result<(), TabrecallError> {
        let Some(record) = self.cache.get(tab_id).await else {
            return Ok(());
        };
        if let Err(first) = self.store.upsert_record(&record).await {
            warn!(%tab_id, error = %first, "record save failed, retrying once");
            let Some(record) = self.cache.get(tab_id).await else {
                return Ok(());
            };
            if let Err(second) = self.store.upsert_record(&record).await {
                error!(%tab_id, error = %second, "record save failed after retry");
                return Err(second);
            }
        }
        Ok(())
    }
}
