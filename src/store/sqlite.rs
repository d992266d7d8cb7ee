//! SQLite-backed store.
//!
//! Each model is one row holding its JSON document plus the columns needed
//! for listing, and a SHA-256 fingerprint of the document used for
//! optimistic concurrency.
//!
//! # Schema
//!
//! ```text
//! models(id PK, name, owner, table_count, updated_at, fingerprint, document)
//! meta(key PK, value)                       -- 'version' -> STORE_VERSION
//! ```
//!
//! `updated_at` is stored as RFC 3339 with a fixed nanosecond fraction so
//! that text order is time order.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::hash::fingerprint;
use super::{check_id, ModelStore, StoreError, StoreResult};
use crate::model::{DataModel, ModelSummary};

/// Current schema version. A database with a different version is refused.
const STORE_VERSION: i32 = 1;

/// SQLite document store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS models (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner TEXT NOT NULL,
                table_count INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                document TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS models_owner ON models (owner);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| row.get(0))
            .optional()?;

        match stored_version {
            Some(v) if v == STORE_VERSION.to_string() => {}
            Some(found) => {
                return Err(StoreError::UnsupportedVersion {
                    found,
                    expected: STORE_VERSION,
                });
            }
            None => {
                self.conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('version', ?)",
                    params![STORE_VERSION.to_string()],
                )?;
            }
        }

        Ok(())
    }

    /// Fingerprint of the stored document, if any.
    pub fn fingerprint(&self, id: &str) -> StoreResult<Option<String>> {
        check_id(id)?;
        Ok(self
            .conn
            .query_row(
                "SELECT fingerprint FROM models WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Save only if the stored document still has fingerprint `expected`
    /// (`None` meaning it must not exist yet). Returns the new fingerprint.
    pub fn save_if_unchanged(&self, model: &DataModel, expected: Option<&str>) -> StoreResult<String> {
        check_id(&model.id)?;
        let tx = self.conn.unchecked_transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT fingerprint FROM models WHERE id = ?",
                params![model.id],
                |row| row.get(0),
            )
            .optional()?;

        if current.as_deref() != expected {
            debug!(id = %model.id, ?expected, ?current, "fingerprint mismatch");
            return Err(StoreError::Conflict {
                id: model.id.clone(),
            });
        }

        let new_fingerprint = write_document(&tx, model)?;
        tx.commit()?;
        info!(id = %model.id, "saved model");
        Ok(new_fingerprint)
    }
}

fn write_document(conn: &Connection, model: &DataModel) -> StoreResult<String> {
    let document = serde_json::to_string(model)?;
    let print = fingerprint(model)?;
    conn.execute(
        "INSERT OR REPLACE INTO models (id, name, owner, table_count, updated_at, fingerprint, document)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            model.id,
            model.name,
            model.owner,
            model.tables.len() as i64,
            model.updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            print,
            document
        ],
    )?;
    Ok(print)
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ModelSummary> {
    let updated_at: String = row.get(3)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    let table_count: i64 = row.get(2)?;

    Ok(ModelSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        table_count: table_count.max(0) as usize,
        updated_at,
        owner: row.get(4)?,
    })
}

impl ModelStore for SqliteStore {
    fn save(&self, model: &DataModel) -> StoreResult<()> {
        check_id(&model.id)?;
        write_document(&self.conn, model)?;
        info!(id = %model.id, "saved model");
        Ok(())
    }

    fn load(&self, id: &str) -> StoreResult<Option<DataModel>> {
        check_id(id)?;
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM models WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn list(&self, owner: Option<&str>) -> StoreResult<Vec<ModelSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, table_count, updated_at, owner FROM models
             WHERE ?1 IS NULL OR owner = ?1
             ORDER BY updated_at DESC, id ASC",
        )?;
        let summaries = stmt
            .query_map(params![owner], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        check_id(id)?;
        let rows = self
            .conn
            .execute("DELETE FROM models WHERE id = ?", params![id])?;
        if rows > 0 {
            info!(id, "deleted model");
        }
        Ok(rows > 0)
    }
}
