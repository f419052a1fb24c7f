// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page note CRUD operations.
//!
//! Notes are an independent namespace keyed by page URL; nothing in the
//! summary pipeline reads or writes them.

use rusqlite::params;
use tabrecall_core::TabrecallError;

use crate::database::Database;

/// Insert or replace the note for a page URL.
pub async fn save_note(db: &Database, url: &str, body: &str) -> Result<(), TabrecallError> {
    let url = url.to_string();
    let body = body.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO page_notes (url, body) VALUES (?1, ?2)
                 ON CONFLICT(url) DO UPDATE SET body = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![url, body],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the note for a page URL, if any.
pub async fn get_note(db: &Database, url: &str) -> Result<Option<String>, TabrecallError> {
    let url = url.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT body FROM page_notes WHERE url = ?1")?;
            let result = stmt.query_row(params![url], |row| row.get::<_, String>(0));
            match result {
                Ok(body) => Ok(Some(body)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all notes as `(url, body)` pairs, most recently updated first.
pub async fn list_notes(db: &Database) -> Result<Vec<(String, String)>, TabrecallError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT url, body FROM page_notes ORDER BY updated_at DESC")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the note for a page URL. Missing rows are a no-op.
pub async fn delete_note(db: &Database, url: &str) -> Result<(), TabrecallError> {
    let url = url.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM page_notes WHERE url = ?1", params![url])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
