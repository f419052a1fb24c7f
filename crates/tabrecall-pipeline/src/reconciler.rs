// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tab lifecycle reconciler.
//!
//! Translates tab lifecycle events into pipeline triggers and record
//! lifecycle changes. Each tab moves through:
//! Untracked -> Capturing -> PipelineRunning -> Settled, back to Capturing
//! on navigation, and to Untracked on close.
//!
//! Also owns the cold-start restore and the backend-ready catch-up pass for
//! records that were captured while the model was still downloading.

use std::collections::HashMap;
use std::sync::Arc;

use tabrecall_core::{
    CaptureSource, CapturedContent, EntryStore, TabId, TabRecord, TabrecallError,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::RecordCache;
use crate::controller::SummaryPipeline;
use crate::events::{EventBus, RecordEvent};
use crate::gate::BackendGate;

/// States in the per-tab lifecycle FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    /// No record; tab unknown or closed.
    Untracked,
    /// Waiting for the capture source to deliver content.
    Capturing,
    /// The summary pipeline is running for the latest capture.
    PipelineRunning,
    /// Pipeline settled (generated value or sentinel) for the current page.
    Settled,
}

impl std::fmt::Display for TabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabState::Untracked => write!(f, "untracked"),
            TabState::Capturing => write!(f, "capturing"),
            TabState::PipelineRunning => write!(f, "pipeline-running"),
            TabState::Settled => write!(f, "settled"),
        }
    }
}

/// Routes tab lifecycle events into the pipeline and keeps records, states,
/// and the persisted store reconciled.
pub struct Reconciler {
    cache: Arc<RecordCache>,
    store: Arc<dyn EntryStore>,
    pipeline: SummaryPipeline,
    capture: Arc<dyn CaptureSource>,
    gate: BackendGate,
    bus: EventBus,
    states: Mutex<HashMap<TabId, TabState>>,
}

impl Reconciler {
    pub fn new(
        cache: Arc<RecordCache>,
        store: Arc<dyn EntryStore>,
        pipeline: SummaryPipeline,
        capture: Arc<dyn CaptureSource>,
        gate: BackendGate,
        bus: EventBus,
    ) -> Self {
        Self {
            cache,
            store,
            pipeline,
            capture,
            gate,
            bus,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Current lifecycle state for a tab.
    pub async fn state_of(&self, tab_id: TabId) -> TabState {
        self.states
            .lock()
            .await
            .get(&tab_id)
            .copied()
            .unwrap_or(TabState::Untracked)
    }

    async fn set_state(&self, tab_id: TabId, state: TabState) {
        debug!(%tab_id, state = %state, "tab state transition");
        self.states.lock().await.insert(tab_id, state);
    }

    /// A new tab opened. No record yet; wait for its first capture.
    pub async fn on_tab_created(&self, tab_id: TabId) {
        self.set_state(tab_id, TabState::Capturing).await;
    }

    /// Content was extracted for a tab: run the pipeline.
    ///
    /// Creates the record if this is the first capture. The tab settles even
    /// when the pipeline reports an error (the record then carries a
    /// sentinel summary).
    pub async fn on_capture(
        &self,
        tab_id: TabId,
        content: CapturedContent,
    ) -> Result<(), TabrecallError> {
        self.set_state(tab_id, TabState::PipelineRunning).await;
        let result = self.pipeline.process_tab(tab_id, content).await;
        if let Err(ref e) = result {
            error!(%tab_id, error = %e, "pipeline run failed");
        }
        self.set_state(tab_id, TabState::Settled).await;
        result
    }

    /// A navigation completed in a tab.
    ///
    /// For tracked web-page tabs the capture source re-extracts the page and
    /// the pipeline reruns, superseding the previous summary and tags. When
    /// re-extraction fails only url/title are refreshed.
    pub async fn on_navigation(
        &self,
        tab_id: TabId,
        url: &str,
        title: &str,
    ) -> Result<(), TabrecallError> {
        if !is_web_url(url) {
            debug!(%tab_id, url, "ignoring navigation to non-web page");
            return Ok(());
        }

        if self.cache.get(tab_id).await.is_none() {
            debug!(%tab_id, "navigation for untracked tab, awaiting first capture");
            self.set_state(tab_id, TabState::Capturing).await;
            return Ok(());
        }

        self.set_state(tab_id, TabState::Capturing).await;
        match self.capture.capture(tab_id).await {
            Ok(content) => self.on_capture(tab_id, content).await,
            Err(e) => {
                warn!(%tab_id, error = %e, "re-capture after navigation failed");
                let url = url.to_string();
                let title = title.to_string();
                if self
                    .cache
                    .modify(tab_id, |r| {
                        r.url = url;
                        r.title = title;
                    })
                    .await
                    .is_some()
                    && let Some(record) = self.cache.get(tab_id).await
                    && let Err(e) = self.store.upsert_record(&record).await
                {
                    error!(%tab_id, error = %e, "failed to persist url/title update");
                }
                Ok(())
            }
        }
    }

    /// A tab closed: drop its record everywhere and tell observers.
    ///
    /// In-flight pipeline completions for this tab become no-ops.
    pub async fn on_tab_removed(&self, tab_id: TabId) {
        self.states.lock().await.remove(&tab_id);

        if self.cache.remove(tab_id).await.is_none() {
            debug!(%tab_id, "close for untracked tab");
            return;
        }

        if let Err(first) = self.store.delete_record(tab_id).await {
            warn!(%tab_id, error = %first, "record delete failed, retrying once");
            if let Err(second) = self.store.delete_record(tab_id).await {
                error!(%tab_id, error = %second, "record delete failed after retry");
            }
        }

        self.bus.publish(RecordEvent::RecordRemoved { tab_id });
        info!(%tab_id, "tab record removed");
    }

    /// Cold-start restore: load all persisted records into the cache.
    ///
    /// Every restored tab starts settled; tabs that were waiting for the
    /// model download are picked up by the catch-up pass once the gate
    /// flips.
    pub async fn restore(&self) -> Result<usize, TabrecallError> {
        let records = self.store.load_records().await?;
        let count = records.len();
        {
            let mut states = self.states.lock().await;
            for tab_id in records.keys() {
                states.insert(*tab_id, TabState::Settled);
            }
        }
        self.cache.replace_all(records).await;
        info!(count, "restored records from store");
        Ok(count)
    }

    /// Spawns the backend-ready catch-up task.
    ///
    /// The task suspends on the readiness gate (no polling) and, on the
    /// not-ready -> ready transition, re-runs the pipeline once for every
    /// record still waiting on the model that has raw text cached.
    pub fn spawn_catch_up(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.gate.ready().await;
            this.run_catch_up().await;
        })
    }

    async fn run_catch_up(&self) {
        let pending: Vec<TabRecord> = self
            .cache
            .sorted_by_recency()
            .await
            .into_iter()
            .filter(|r| r.awaiting_model() && !r.raw_text.is_empty())
            .collect();

        if pending.is_empty() {
            debug!("backend ready, no records waiting for catch-up");
            return;
        }

        info!(count = pending.len(), "backend ready, re-running deferred pipelines");
        for record in pending {
            let content = CapturedContent {
                url: record.url.clone(),
                title: record.title.clone(),
                body_text: record.raw_text.clone(),
            };
            if let Err(e) = self.on_capture(record.tab_id, content).await {
                error!(tab_id = %record.tab_id, error = %e, "catch-up run failed");
            }
        }
    }
}

/// True for pages the pipeline tracks (http/https only; browser-internal
/// pages have no capturable article content).
fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
