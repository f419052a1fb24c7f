// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI backend for deterministic testing.
//!
//! `MockBackend` implements `AiBackend` with pre-configured responses,
//! enabling fast, CI-runnable tests without a local model server.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tabrecall_core::{
    AdapterType, AiBackend, HealthStatus, ServiceAdapter, TabId, TabRecord, TabrecallError,
};

/// How the mock backend should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// All calls succeed.
    #[default]
    None,
    /// All calls fail with `BackendUnavailable`.
    Unavailable,
    /// All calls fail with a `Backend` execution error.
    Execution,
}

/// Per-operation failure configuration.
#[derive(Debug, Clone, Copy, Default)]
struct FailureConfig {
    summarize: FailureMode,
    classify: FailureMode,
    rank: FailureMode,
}

/// A mock AI backend that returns pre-configured responses.
///
/// Summaries and labels are popped from FIFO queues; empty queues fall back
/// to deterministic defaults. Call counters let tests assert that a call was
/// (or was not) made at all.
pub struct MockBackend {
    summaries: Arc<Mutex<VecDeque<String>>>,
    labels: Arc<Mutex<VecDeque<String>>>,
    failure: Arc<Mutex<FailureConfig>>,
    summarize_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    rank_calls: AtomicUsize,
}

impl MockBackend {
    /// Create a new mock backend with empty response queues.
    pub fn new() -> Self {
        Self {
            summaries: Arc::new(Mutex::new(VecDeque::new())),
            labels: Arc::new(Mutex::new(VecDeque::new())),
            failure: Arc::new(Mutex::new(FailureConfig::default())),
            summarize_calls: AtomicUsize::new(0),
            classify_calls: AtomicUsize::new(0),
            rank_calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock backend pre-loaded with summaries and labels.
    pub fn with_responses(summaries: Vec<String>, labels: Vec<String>) -> Self {
        let backend = Self::new();
        {
            let mut q = backend.summaries.try_lock().expect("fresh mutex");
            q.extend(summaries);
        }
        {
            let mut q = backend.labels.try_lock().expect("fresh mutex");
            q.extend(labels);
        }
        backend
    }

    /// Queue another summary response.
    pub async fn push_summary(&self, text: impl Into<String>) {
        self.summaries.lock().await.push_back(text.into());
    }

    /// Queue another classification label.
    pub async fn push_label(&self, label: impl Into<String>) {
        self.labels.lock().await.push_back(label.into());
    }

    /// Switch the failure mode for all subsequent calls.
    pub async fn set_failure_mode(&self, mode: FailureMode) {
        let mut failure = self.failure.lock().await;
        failure.summarize = mode;
        failure.classify = mode;
        failure.rank = mode;
    }

    /// Make only `classify` fail, leaving summarization working.
    pub async fn set_classify_failure(&self, mode: FailureMode) {
        self.failure.lock().await.classify = mode;
    }

    /// Number of `summarize` invocations so far.
    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    /// Number of `classify` invocations so far.
    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    /// Number of `rank` invocations so far.
    pub fn rank_calls(&self) -> usize {
        self.rank_calls.load(Ordering::SeqCst)
    }

    fn mode_error(mode: FailureMode) -> Result<(), TabrecallError> {
        match mode {
            FailureMode::None => Ok(()),
            FailureMode::Unavailable => Err(TabrecallError::BackendUnavailable {
                message: "mock backend unavailable".to_string(),
            }),
            FailureMode::Execution => Err(TabrecallError::Backend {
                message: "mock execution failure".to_string(),
                source: None,
            }),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        match self.failure.lock().await.summarize {
            FailureMode::None => Ok(HealthStatus::Healthy),
            FailureMode::Unavailable => Ok(HealthStatus::Unhealthy("unavailable".into())),
            FailureMode::Execution => Ok(HealthStatus::Degraded("failing requests".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        Ok(())
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn summarize(&self, text: &str) -> Result<String, TabrecallError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        Self::mode_error(self.failure.lock().await.summarize)?;
        let scripted = self.summaries.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| {
            let head: String = text.chars().take(40).collect();
            format!("Mock summary of: {head}")
        }))
    }

    async fn classify(&self, _summary: &str) -> Result<String, TabrecallError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        Self::mode_error(self.failure.lock().await.classify)?;
        let scripted = self.labels.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| "Reference".to_string()))
    }

    async fn rank(
        &self,
        _query: &str,
        records: &[TabRecord],
    ) -> Result<Vec<TabId>, TabrecallError> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        Self::mode_error(self.failure.lock().await.rank)?;
        // Deterministic: given order.
        Ok(records.iter().map(|r| r.tab_id).collect())
    }
}
