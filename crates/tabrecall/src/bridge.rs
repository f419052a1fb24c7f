// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stdio bridge to the browser companion.
//!
//! The companion streams tab lifecycle events as one JSON object per stdin
//! line; the daemon answers with record patches and capture requests on
//! stdout. [`CompanionBridge`] is also the daemon's [`CaptureSource`]: a
//! `capture(tab_id)` call writes a `capture_request` line and resolves when
//! the companion's matching `captured` line arrives.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabrecall_core::{
    AdapterType, CaptureSource, CapturedContent, HealthStatus, ServiceAdapter, TabId,
    TabrecallError,
};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::debug;

/// How long a capture request may wait for the companion's reply.
const CAPTURE_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Events arriving from the companion, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompanionEvent {
    /// A new tab opened; content will follow.
    TabCreated { tab_id: i64 },
    /// Extracted page content, either unsolicited (first load) or answering
    /// a `capture_request`.
    Captured {
        tab_id: i64,
        url: String,
        title: String,
        body_text: String,
    },
    /// A navigation committed in an existing tab.
    Navigated {
        tab_id: i64,
        url: String,
        title: String,
    },
    /// The tab closed.
    TabClosed { tab_id: i64 },
    /// The user finished installing the model; flip the readiness gate.
    BackendReady,
    /// Pull query: all tracked records, most recent first.
    List,
    /// Pull query: records ranked against a search query.
    Search { query: String },
}

/// Requests the daemon writes back to the companion.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum CompanionRequest {
    CaptureRequest { tab_id: i64 },
}

/// Replies to the companion's pull queries.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueryReply<'a> {
    Records { records: &'a [tabrecall_core::TabRecord] },
    SearchResults {
        query: &'a str,
        records: &'a [tabrecall_core::TabRecord],
    },
}

/// Request/reply plumbing over the stdio line protocol.
pub struct CompanionBridge {
    out_tx: mpsc::UnboundedSender<String>,
    pending: Mutex<HashMap<TabId, oneshot::Sender<CapturedContent>>>,
    reply_timeout: Duration,
}

impl CompanionBridge {
    /// Creates a bridge writing outbound lines into `out_tx`.
    pub fn new(out_tx: mpsc::UnboundedSender<String>) -> Self {
        Self::with_timeout(out_tx, CAPTURE_REPLY_TIMEOUT)
    }

    /// Creates a bridge with an explicit reply timeout (tests).
    pub fn with_timeout(out_tx: mpsc::UnboundedSender<String>, reply_timeout: Duration) -> Self {
        Self {
            out_tx,
            pending: Mutex::new(HashMap::new()),
            reply_timeout,
        }
    }

    /// Routes an inbound captured payload to a waiting `capture()` call.
    ///
    /// Returns false when nobody is waiting, i.e. the capture was
    /// unsolicited and should go straight to the reconciler.
    pub async fn fulfill(&self, tab_id: TabId, content: CapturedContent) -> bool {
        match self.pending.lock().await.remove(&tab_id) {
            Some(tx) => {
                // A dropped receiver means the requester already timed out.
                let delivered = tx.send(content).is_ok();
                debug!(%tab_id, delivered, "routed captured payload to pending request");
                delivered
            }
            None => false,
        }
    }
}

#[async_trait]
impl ServiceAdapter for CompanionBridge {
    fn name(&self) -> &str {
        "stdio-companion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Capture
    }

    async fn health_check(&self) -> Result<HealthStatus, TabrecallError> {
        if self.out_tx.is_closed() {
            Ok(HealthStatus::Unhealthy("companion output closed".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), TabrecallError> {
        self.pending.lock().await.clear();
        Ok(())
    }
}

#[async_trait]
impl CaptureSource for CompanionBridge {
    async fn capture(&self, tab_id: TabId) -> Result<CapturedContent, TabrecallError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(tab_id, tx);

        let line = serde_json::to_string(&CompanionRequest::CaptureRequest { tab_id: tab_id.0 })
            .map_err(|e| TabrecallError::Internal(format!("failed to encode request: {e}")))?;
        if self.out_tx.send(line).is_err() {
            self.pending.lock().await.remove(&tab_id);
            return Err(TabrecallError::Internal(
                "companion output channel closed".into(),
            ));
        }

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(_)) => Err(TabrecallError::Internal(
                "capture request dropped before completion".into(),
            )),
            Err(_) => {
                self.pending.lock().await.remove(&tab_id);
                Err(TabrecallError::Timeout {
                    duration: self.reply_timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn parses_every_event_kind() {
        let cases = [
            (r#"{"event":"tab_created","tab_id":4}"#, CompanionEvent::TabCreated { tab_id: 4 }),
            (
                r#"{"event":"captured","tab_id":4,"url":"https://a","title":"A","body_text":"text"}"#,
                CompanionEvent::Captured {
                    tab_id: 4,
                    url: "https://a".into(),
                    title: "A".into(),
                    body_text: "text".into(),
                },
            ),
            (
                r#"{"event":"navigated","tab_id":4,"url":"https://b","title":"B"}"#,
                CompanionEvent::Navigated {
                    tab_id: 4,
                    url: "https://b".into(),
                    title: "B".into(),
                },
            ),
            (r#"{"event":"tab_closed","tab_id":4}"#, CompanionEvent::TabClosed { tab_id: 4 }),
            (r#"{"event":"backend_ready"}"#, CompanionEvent::BackendReady),
            (r#"{"event":"list"}"#, CompanionEvent::List),
            (
                r#"{"event":"search","query":"rust async"}"#,
                CompanionEvent::Search { query: "rust async".into() },
            ),
        ];

        for (line, expected) in cases {
            let parsed: CompanionEvent = serde_json::from_str(line).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn query_replies_serialize_with_event_tag() {
        let record = tabrecall_core::TabRecord::new(
            TabId(1),
            "https://a".into(),
            "A".into(),
            "text".into(),
        );
        let records = vec![record];

        let json =
            serde_json::to_value(QueryReply::Records { records: &records }).unwrap();
        assert_eq!(json["event"], "records");
        assert_eq!(json["records"][0]["tab_id"], 1);

        let json = serde_json::to_value(QueryReply::SearchResults {
            query: "rust",
            records: &records,
        })
        .unwrap();
        assert_eq!(json["event"], "search_results");
        assert_eq!(json["query"], "rust");
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<CompanionEvent>(r#"{"event":"dance"}"#).is_err());
        assert!(serde_json::from_str::<CompanionEvent>("not json").is_err());
    }

    #[tokio::test]
    async fn capture_writes_request_and_awaits_fulfillment() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(CompanionBridge::new(out_tx));

        let request = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.capture(TabId(7)).await })
        };

        // The daemon wrote a capture_request line for tab 7.
        let line = out_rx.recv().await.unwrap();
        assert_eq!(line, r#"{"event":"capture_request","tab_id":7}"#);

        let content = CapturedContent {
            url: "https://a".into(),
            title: "A".into(),
            body_text: "fresh text".into(),
        };
        assert!(bridge.fulfill(TabId(7), content.clone()).await);

        let got = request.await.unwrap().unwrap();
        assert_eq!(got, content);
    }

    #[tokio::test]
    async fn unsolicited_capture_is_not_consumed() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let bridge = CompanionBridge::new(out_tx);

        let content = CapturedContent {
            url: "https://a".into(),
            title: "A".into(),
            body_text: "text".into(),
        };
        assert!(!bridge.fulfill(TabId(1), content).await);
    }

    #[tokio::test]
    async fn capture_times_out_without_reply() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let bridge = CompanionBridge::with_timeout(out_tx, Duration::from_millis(20));

        let err = bridge.capture(TabId(2)).await.unwrap_err();
        assert!(matches!(err, TabrecallError::Timeout { .. }));
        // The pending slot was cleaned up.
        assert!(bridge.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn capture_fails_fast_when_output_closed() {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        drop(out_rx);
        let bridge = CompanionBridge::new(out_tx);

        assert!(bridge.capture(TabId(3)).await.is_err());
        assert!(bridge.pending.lock().await.is_empty());
    }
}
