// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI backend trait for local summarization, classification, and ranking.

use async_trait::async_trait;

use crate::error::TabrecallError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{TabId, TabRecord};

/// Adapter for the on-device AI capability.
///
/// The backend is an opaque collaborator: it may be unavailable (model not
/// installed yet) or fail a single request. Callers convert failures into
/// sentinel field values; nothing here is retried automatically.
#[async_trait]
pub trait AiBackend: ServiceAdapter {
    /// Produces a short summary of the given page text.
    async fn summarize(&self, text: &str) -> Result<String, TabrecallError>;

    /// Produces a single category label for a summary.
    async fn classify(&self, summary: &str) -> Result<String, TabrecallError>;

    /// Ranks records by relevance to a query, best match first.
    ///
    /// Best-effort: callers fall back to an empty result on failure.
    async fn rank(
        &self,
        query: &str,
        records: &[TabRecord],
    ) -> Result<Vec<TabId>, TabrecallError>;
}
