// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock capture source with scripted per-tab content.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tabrecall_core::{
    AdapterType, CaptureSource, CapturedContent, HealthStatus, ServiceAdapter, TabId,
    TabrecallError,
};

/// A mock capture source returning scripted content per tab.
///
/// Each `capture` call pops the next scripted payload for that tab;
/// capturing a tab with nothing scripted is an error, mirroring a companion
/// that cannot reach the page.
pub struct MockCapture {
    scripted: Arc<Mutex<HashMap<TabId, VecDeque<CapturedContent>>>>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue content for a future `capture(tab_id)` call.
    pub async fn script(&self, tab_id: TabId, content: CapturedContent) {
        self.scripted
            .lock()
            .await
            .entry(tab_id)
            .or_default()
            .push_back(content);
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceAdapter for MockCapture {
    fn name(&self) -> &str {
        "mock-capture"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Capture
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        Ok(())
    }
}

#[async_trait]
impl CaptureSource for MockCapture {
    async fn capture(&self, tab_id: TabId) -> Result<CapturedContent, TabrecallError> {
        self.scripted
            .lock()
            .await
            .get_mut(&tab_id)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| TabrecallError::Internal(format!("no scripted capture for tab {tab_id}")))
    }
}
