// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tabrecall serve` command implementation.
//!
//! Starts the full daemon: SQLite entry store, local Ollama backend behind
//! the readiness gate, summary pipeline, lifecycle reconciler, and the stdio
//! companion bridge. Record patches stream to stdout as they are published;
//! companion events are consumed from stdin until EOF or a shutdown signal.

use std::sync::Arc;

use tabrecall_config::TabrecallConfig;
use tabrecall_core::{
    AiBackend, CapturedContent, EntryStore, ServiceAdapter, TabId, TabrecallError,
};
use tabrecall_ollama::OllamaBackend;
use tabrecall_pipeline::{
    BackendGate, EventBus, PipelineSettings, QuerySurface, RecordCache, Reconciler,
    SummaryPipeline,
};
use tabrecall_store::SqliteStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::bridge::{CompanionBridge, CompanionEvent, QueryReply};
use crate::shutdown;

/// Runs the `tabrecall serve` command.
pub async fn run_serve(config: TabrecallConfig) -> Result<(), TabrecallError> {
    init_tracing(&config.daemon.log_level);
    info!("starting tabrecall daemon");

    // Storage.
    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    // Backend behind the readiness gate.
    let backend = Arc::new(OllamaBackend::new(&config.backend)?);
    let gate = BackendGate::new();

    // Shared state and fan-out.
    let cache = Arc::new(RecordCache::new());
    let bus = EventBus::new();

    // Outbound line writer: everything the daemon says goes through here.
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let bridge = Arc::new(CompanionBridge::new(out_tx.clone()));

    let pipeline = SummaryPipeline::new(
        cache.clone(),
        store.clone() as Arc<dyn EntryStore>,
        backend.clone() as Arc<dyn AiBackend>,
        gate.clone(),
        bus.clone(),
        PipelineSettings::from_config(&config),
    );
    let reconciler = Arc::new(Reconciler::new(
        cache.clone(),
        store.clone(),
        pipeline,
        bridge.clone(),
        gate.clone(),
        bus.clone(),
    ));
    let surface = Arc::new(QuerySurface::new(
        cache.clone(),
        backend.clone() as Arc<dyn AiBackend>,
    ));

    // Cold-start restore, then arm the backend-ready catch-up pass.
    let restored = reconciler.restore().await?;
    let _catch_up = reconciler.spawn_catch_up();

    // Startup readiness probe. A missing model is not fatal: the gate stays
    // closed and captures keep raw text until a backend_ready event.
    {
        let backend = backend.clone();
        let gate = gate.clone();
        let auto_pull = config.backend.auto_pull;
        tokio::spawn(async move {
            match backend.ensure_ready(auto_pull).await {
                Ok(()) => gate.mark_ready(),
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "backend not ready, waiting for backend_ready event");
                }
                Err(e) => error!(error = %e, "backend readiness probe failed"),
            }
        });
    }

    let cancel = shutdown::install_signal_handler();

    // Stdout writer task.
    let writer = tokio::spawn(async move {
        let mut out_rx = out_rx;
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
            {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    // Record events fan out to the companion as JSON lines.
    {
        let mut rx = bus.subscribe();
        let out_tx = out_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(event) => match serde_json::to_string(&event) {
                            Ok(line) => {
                                let _ = out_tx.send(line);
                            }
                            Err(e) => warn!(error = %e, "failed to encode record event"),
                        },
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "companion fell behind, dropped record events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = cancel.cancelled() => break,
                }
            }
        });
    }

    info!(restored, "tabrecall daemon running on stdio bridge");

    // Inbound companion event loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<CompanionEvent>(line) {
                        Ok(event) => {
                            dispatch_event(event, &reconciler, &bridge, &gate, &surface, &out_tx)
                                .await;
                        }
                        Err(e) => warn!(error = %e, "ignoring malformed companion event"),
                    }
                }
                Ok(None) => {
                    info!("companion stream closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "stdin read error");
                    break;
                }
            },
            _ = cancel.cancelled() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Flush and close storage before exit.
    store.shutdown().await?;
    writer.abort();
    info!("tabrecall daemon stopped");
    Ok(())
}

/// Routes one companion event into the reconciler.
///
/// Capture and navigation handling spawn so a slow pipeline run never
/// blocks the event loop; the pipeline's generation guards keep concurrent
/// runs for one tab safe.
async fn dispatch_event(
    event: CompanionEvent,
    reconciler: &Arc<Reconciler>,
    bridge: &Arc<CompanionBridge>,
    gate: &BackendGate,
    surface: &Arc<QuerySurface>,
    out_tx: &mpsc::UnboundedSender<String>,
) {
    match event {
        CompanionEvent::TabCreated { tab_id } => {
            reconciler.on_tab_created(TabId(tab_id)).await;
        }
        CompanionEvent::Captured {
            tab_id,
            url,
            title,
            body_text,
        } => {
            let tab_id = TabId(tab_id);
            let content = CapturedContent {
                url,
                title,
                body_text,
            };
            // Replies to an outstanding capture_request are routed to the
            // waiting navigation handler instead of starting a second run.
            if bridge.fulfill(tab_id, content.clone()).await {
                debug!(%tab_id, "captured payload answered a pending request");
                return;
            }
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                let _ = reconciler.on_capture(tab_id, content).await;
            });
        }
        CompanionEvent::Navigated { tab_id, url, title } => {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                let _ = reconciler.on_navigation(TabId(tab_id), &url, &title).await;
            });
        }
        CompanionEvent::TabClosed { tab_id } => {
            reconciler.on_tab_removed(TabId(tab_id)).await;
        }
        CompanionEvent::BackendReady => {
            info!("companion reported backend ready");
            gate.mark_ready();
        }
        CompanionEvent::List => {
            let records = surface.list_records().await;
            send_reply(out_tx, &QueryReply::Records { records: &records });
        }
        CompanionEvent::Search { query } => {
            // Ranking goes through the backend; never block the event loop.
            let surface = surface.clone();
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                let records = surface.search(&query).await;
                send_reply(
                    &out_tx,
                    &QueryReply::SearchResults {
                        query: &query,
                        records: &records,
                    },
                );
            });
        }
    }
}

/// Encodes a query reply onto the outbound line channel.
fn send_reply(out_tx: &mpsc::UnboundedSender<String>, reply: &QueryReply<'_>) {
    match serde_json::to_string(reply) {
        Ok(line) => {
            let _ = out_tx.send(line);
        }
        Err(e) => warn!(error = %e, "failed to encode query reply"),
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr; stdout belongs to the companion line protocol.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabrecall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
