// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tabrecall_core::TabrecallError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert a tokio_rusqlite error into `TabrecallError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> TabrecallError {
    TabrecallError::Storage {
        source: Box::new(e),
    }
}

fn map_io_err(e: std::io::Error) -> TabrecallError {
    TabrecallError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite connection.
///
/// Owning this struct IS holding the single writer: every query module
/// accepts `&Database` and funnels its closure through [`Database::connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path`, applies
    /// PRAGMAs, and runs pending migrations.
    pub async fn open(path: &str) -> Result<Self, TabrecallError> {
        Self::open_with_options(path, true).await
    }

    /// Opens the database with explicit control over WAL mode.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, TabrecallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(map_io_err)?;
        }

        // Migrations run to completion on a blocking connection before the
        // single async writer opens.
        let migration_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), TabrecallError> {
            let mut conn =
                rusqlite::Connection::open(&migration_path).map_err(|e| {
                    TabrecallError::Storage {
                        source: Box::new(e),
                    }
                })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| TabrecallError::Internal(format!("migration task panicked: {e}")))??;

        let conn = Connection::open(path)
            .await
            .map_err(|e| TabrecallError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = path, wal_mode = wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying single-writer connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL and flushes pending writes.
    pub async fn close(&self) -> Result<(), TabrecallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
