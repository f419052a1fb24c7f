// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tabrecall status` command implementation.
//!
//! Reads the persisted store directly (WAL mode allows a concurrent reader
//! next to a running daemon) and prints the tracked records, most recent
//! first.

use serde::Serialize;
use tabrecall_config::TabrecallConfig;
use tabrecall_core::{EntryStore, TabRecord, TabrecallError};
use tabrecall_store::SqliteStore;

/// How many records the human-readable view shows.
const MAX_LISTED: usize = 10;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusReport {
    record_count: usize,
    note_count: usize,
    records: Vec<TabRecord>,
}

/// Run the `tabrecall status` command.
pub async fn run_status(config: &TabrecallConfig, json: bool) -> Result<(), TabrecallError> {
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;

    let mut records: Vec<TabRecord> = store.load_records().await?.into_values().collect();
    records.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    let note_count = store.list_notes().await?.len();
    store.close().await?;

    if json {
        let report = StatusReport {
            record_count: records.len(),
            note_count,
            records,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|e| TabrecallError::Internal(format!("failed to render report: {e}")))?
        );
        return Ok(());
    }

    println!("tracked tabs: {}", records.len());
    println!("page notes:   {note_count}");
    if records.is_empty() {
        return Ok(());
    }

    println!();
    for record in records.iter().take(MAX_LISTED) {
        let tags = if record.tags.is_empty() {
            "-".to_string()
        } else {
            record.tags.join(", ")
        };
        println!("  [{}] {} ({tags})", record.tab_id, record.title);
        println!("      {}", clip(&record.summary, 100));
    }
    if records.len() > MAX_LISTED {
        println!("  ... and {} more", records.len() - MAX_LISTED);
    }

    Ok(())
}

/// Clip text to `max` characters with an ellipsis.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max).collect();
        format!("{clipped}...")
    }
}
