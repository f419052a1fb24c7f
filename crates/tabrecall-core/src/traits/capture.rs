// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture source trait for on-demand page content extraction.

use async_trait::async_trait;

use crate::error::TabrecallError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{CapturedContent, TabId};

/// Adapter producing extracted page content for a tab on demand.
///
/// Re-invoked after navigations; may race with pipeline completion, which
/// the capture-generation guard in the record handles.
#[async_trait]
pub trait CaptureSource: ServiceAdapter {
    /// Extracts `{url, title, body_text}` for the given tab.
    async fn capture(&self, tab_id: TabId) -> Result<CapturedContent, TabrecallError>;
}
