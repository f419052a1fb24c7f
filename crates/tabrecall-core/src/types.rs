// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the tabrecall daemon.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a browsing tab, assigned by the host environment.
///
/// Opaque to this system: unique among currently-tracked tabs, never
/// generated locally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary placeholder shown while generation is still pending.
pub const SUMMARY_PENDING: &str = "Generating summary...";

/// Summary sentinel for pages with too little readable text.
pub const SUMMARY_INSUFFICIENT: &str = "Not enough readable content for AI summary.";

/// Summary sentinel while the local model has not finished downloading.
///
/// Doubles as the marker the backend-ready catch-up path looks for.
pub const SUMMARY_MODEL_PENDING: &str =
    "AI model is still downloading. This page will be summarized once the model is ready.";

/// Summary sentinel applied when the backend failed or timed out.
pub const SUMMARY_FAILED: &str =
    "Summary unavailable: the AI model could not process this page.";

/// Fallback tag applied when classification cannot run or fails.
pub const TAG_UNCATEGORIZED: &str = "Uncategorized";

/// Derived state for one tracked tab.
///
/// Persisted as a JSON value keyed by [`TabId`]. `summary` and `tags` are
/// only ever derived from the `raw_text` of the capture generation they were
/// requested for; `capture_gen` enforces that under concurrent triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabRecord {
    /// Host-assigned tab identifier.
    pub tab_id: TabId,
    /// Last known URL.
    pub url: String,
    /// Last known title.
    pub title: String,
    /// Captured page text for the current page load. May be empty.
    pub raw_text: String,
    /// Generated summary, or one of the sentinel values.
    pub summary: String,
    /// Category labels, empty until classification completes.
    pub tags: Vec<String>,
    /// Epoch milliseconds; strictly increases on every field mutation.
    pub last_updated: i64,
    /// Reserved grouping identifier, not populated.
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Capture generation counter. Bumped per pipeline trigger; async
    /// completions write back only while it still matches their snapshot.
    #[serde(default)]
    pub capture_gen: u64,
}

impl TabRecord {
    /// Creates a fresh record for a first capture, summary pending.
    pub fn new(tab_id: TabId, url: String, title: String, raw_text: String) -> Self {
        Self {
            tab_id,
            url,
            title,
            raw_text,
            summary: SUMMARY_PENDING.to_string(),
            tags: Vec::new(),
            last_updated: now_millis(),
            cluster_id: None,
            capture_gen: 0,
        }
    }

    /// Advances `last_updated`, keeping it strictly increasing even when the
    /// wall clock has not ticked between two mutations.
    pub fn touch(&mut self) {
        self.last_updated = now_millis().max(self.last_updated + 1);
    }

    /// True while this record is waiting for the model download to finish.
    pub fn awaiting_model(&self) -> bool {
        self.summary == SUMMARY_MODEL_PENDING
    }

    /// True once the pipeline has settled for the current capture, i.e. the
    /// summary is no longer the pending placeholder.
    pub fn is_settled(&self) -> bool {
        self.summary != SUMMARY_PENDING
    }
}

/// Page content produced by a capture source for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedContent {
    pub url: String,
    pub title: String,
    /// Extracted visible text. May be empty for chrome/about pages.
    pub body_text: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind the [`crate::traits::ServiceAdapter`] base trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Backend,
    Capture,
    Storage,
}

/// Current epoch time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
