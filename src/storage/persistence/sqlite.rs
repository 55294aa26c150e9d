//! `SQLite`-based persistence backend.
//!
//! Provides durable storage of admitted records. The in-memory indices are
//! rebuilt from this table when a registry is opened.

use crate::models::{ContentFingerprint, MetadataFingerprint, Publisher, Record, RecordId};
use crate::storage::sqlite::{
    acquire_lock, configure_connection, record_operation_metrics, status_label,
};
use crate::storage::traits::PersistenceBackend;
use crate::{Error, Result};
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

/// `SQLite`-based persistence backend.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// The registry already serializes writers; the mutex only makes the
/// backend shareable.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE records (
///     id INTEGER PRIMARY KEY,
///     content_fingerprint BLOB NOT NULL UNIQUE,
///     metadata_fingerprint BLOB NOT NULL,
///     publisher TEXT NOT NULL,
///     timestamp INTEGER NOT NULL,
///     source TEXT NOT NULL
/// )
/// ```
///
/// The `UNIQUE` constraint is a second line of defence behind the
/// duplicate index: a conflicting insert fails instead of creating a
/// second owner.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Opens (or creates) a database file.
    ///
    /// Parent directories are created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_data_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let backend = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        backend.initialize()?;
        Ok(backend)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let backend = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        backend.initialize()?;
        Ok(backend)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY,
                content_fingerprint BLOB NOT NULL UNIQUE,
                metadata_fingerprint BLOB NOT NULL,
                publisher TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                source TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_records_publisher ON records(publisher, id);",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "create_records_table".to_string(),
            cause: e.to_string(),
        })
    }
}

/// Reads a 32-byte digest column.
fn digest_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<[u8; 32]> {
    let bytes: Vec<u8> = row.get(idx)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Blob,
            format!("expected 32-byte digest, found {len} bytes").into(),
        )
    })
}

#[allow(clippy::cast_sign_loss)]
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let id: i64 = row.get(0)?;
    let timestamp: i64 = row.get(4)?;
    Ok(Record {
        id: RecordId::new(id as u64),
        content_fingerprint: ContentFingerprint::from_bytes(digest_column(row, 1)?),
        metadata_fingerprint: MetadataFingerprint::from_bytes(digest_column(row, 2)?),
        publisher: Publisher::new(row.get::<_, String>(3)?),
        timestamp: timestamp as u64,
        source: row.get(5)?,
    })
}

impl PersistenceBackend for SqliteBackend {
    #[instrument(skip(self, record), fields(operation = "append", backend = "sqlite", record.id = %record.id))]
    fn append(&self, record: &Record) -> Result<()> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);

            // rusqlite has no ToSql for u64
            #[allow(clippy::cast_possible_wrap)]
            let (id, timestamp) = (record.id.get() as i64, record.timestamp as i64);

            conn.execute(
                "INSERT INTO records (id, content_fingerprint, metadata_fingerprint, publisher, timestamp, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    record.content_fingerprint.as_bytes().as_slice(),
                    record.metadata_fingerprint.as_bytes().as_slice(),
                    record.publisher.as_str(),
                    timestamp,
                    record.source,
                ],
            )
            .map_err(|e| Error::OperationFailed {
                operation: "insert_record".to_string(),
                cause: e.to_string(),
            })?;

            Ok(())
        })();

        record_operation_metrics("sqlite", "append", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "load_all", backend = "sqlite"))]
    fn load_all(&self) -> Result<Vec<Record>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);

            let mut stmt = conn
                .prepare(
                    "SELECT id, content_fingerprint, metadata_fingerprint, publisher, timestamp, source
                     FROM records
                     ORDER BY id ASC",
                )
                .map_err(|e| Error::OperationFailed {
                    operation: "prepare_load_all".to_string(),
                    cause: e.to_string(),
                })?;

            let rows = stmt
                .query_map([], record_from_row)
                .map_err(|e| Error::OperationFailed {
                    operation: "load_all".to_string(),
                    cause: e.to_string(),
                })?;

            let records = rows
                .map(|row| {
                    row.map_err(|e| Error::OperationFailed {
                        operation: "load_all_row".to_string(),
                        cause: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(records)
        })();

        record_operation_metrics("sqlite", "load_all", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "count", backend = "sqlite"))]
    #[allow(clippy::cast_sign_loss)]
    fn count(&self) -> Result<u64> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
                .map_err(|e| Error::OperationFailed {
                    operation: "count".to_string(),
                    cause: e.to_string(),
                })?;

            Ok(count as u64)
        })();

        record_operation_metrics("sqlite", "count", start, status_label(&result));
        result
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: u64, content: u8) -> Record {
        Record {
            id: RecordId::new(id),
            content_fingerprint: ContentFingerprint::from_bytes([content; 32]),
            metadata_fingerprint: MetadataFingerprint::from_bytes([9u8; 32]),
            publisher: Publisher::new("0xb72e8049e0ee6018e49e9b3995e70b8faf705897"),
            timestamp: 1_700_000_000 + id,
            source: "Reuters".to_string(),
        }
    }

    #[test]
    fn test_append_and_load_roundtrip() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.append(&record(1, 1)).unwrap();
        backend.append(&record(2, 2)).unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded, vec![record(1, 1), record(2, 2)]);
        assert_eq!(backend.count().unwrap(), 2);
        assert!(backend.db_path().is_none());
    }

    #[test]
    fn test_unique_content_fingerprint_enforced() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.append(&record(1, 1)).unwrap();

        let err = backend.append(&record(2, 1)).unwrap_err();
        assert!(matches!(
            err,
            Error::OperationFailed { ref operation, .. } if operation == "insert_record"
        ));
        assert_eq!(backend.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.append(&record(1, 1)).unwrap();
        assert!(backend.append(&record(1, 2)).is_err());
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.db");

        {
            let backend = SqliteBackend::new(&path).unwrap();
            backend.append(&record(1, 1)).unwrap();
        }

        let reopened = SqliteBackend::new(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap(), vec![record(1, 1)]);
        assert_eq!(reopened.db_path(), Some(path.as_path()));
    }

    #[test]
    fn test_corrupt_digest_reported() {
        let backend = SqliteBackend::in_memory().unwrap();
        {
            let conn = acquire_lock(&backend.conn);
            conn.execute(
                "INSERT INTO records VALUES (1, x'00', x'00', 'p', 1, 's')",
                [],
            )
            .unwrap();
        }

        let err = backend.load_all().unwrap_err();
        assert!(err.to_string().contains("32-byte digest"));
    }
}
