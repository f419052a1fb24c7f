// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tab record CRUD operations.
//!
//! Records are stored as one JSON value per tab id so that concurrent
//! updates for different tabs are independent row writes, never a
//! whole-map overwrite.

use std::collections::HashMap;

use rusqlite::params;
use tabrecall_core::{TabId, TabRecord, TabrecallError};

use crate::database::Database;

fn map_json_err(e: serde_json::Error) -> TabrecallError {
    TabrecallError::Storage {
        source: Box::new(e),
    }
}

/// Insert or replace the record for its tab id.
pub async fn upsert_record(db: &Database, record: &TabRecord) -> Result<(), TabrecallError> {
    let tab_id = record.tab_id.0;
    let last_updated = record.last_updated;
    let json = serde_json::to_string(record).map_err(map_json_err)?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tab_records (tab_id, record, last_updated) VALUES (?1, ?2, ?3)
                 ON CONFLICT(tab_id) DO UPDATE SET record = ?2, last_updated = ?3",
                params![tab_id, json, last_updated],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the record for a tab id, if present.
pub async fn get_record(db: &Database, tab_id: TabId) -> Result<Option<TabRecord>, TabrecallError> {
    let id = tab_id.0;
    let json: Option<String> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT record FROM tab_records WHERE tab_id = ?1")?;
            let result = stmt.query_row(params![id], |row| row.get::<_, String>(0));
            match result {
                Ok(json) => Ok(Some(json)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    json.map(|j| serde_json::from_str(&j).map_err(map_json_err))
        .transpose()
}

/// Load every persisted record into a map keyed by tab id.
pub async fn load_all_records(
    db: &Database,
) -> Result<HashMap<TabId, TabRecord>, TabrecallError> {
    let rows: Vec<String> = db
        .connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT record FROM tab_records ORDER BY last_updated DESC")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let mut records = HashMap::with_capacity(rows.len());
    for json in rows {
        let record: TabRecord = serde_json::from_str(&json).map_err(map_json_err)?;
        records.insert(record.tab_id, record);
    }
    Ok(records)
}

/// Delete the record for a tab id. Missing rows are a no-op.
pub async fn delete_record(db: &Database, tab_id: TabId) -> Result<(), TabrecallError> {
    let id = tab_id.0;
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM tab_records WHERE tab_id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
