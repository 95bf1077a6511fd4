//! Storage layer for aeneas.
//!
//! This module provides `SQLite`-based persistent storage for submitted
//! reports. Ids are assigned by `SQLite` on insert.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::report::{NewReport, Report};

/// Path reported for in-memory databases.
const MEMORY_PATH: &str = ":memory:";

/// Storage engine for reports.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database. The path `:memory:`
    /// opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str() == MEMORY_PATH {
            return Self::open_in_memory();
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a report and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, report: &NewReport) -> Result<Report> {
        self.conn.execute(
            r"
            INSERT INTO reports (raw, product, version, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                report.raw,
                report.product,
                report.version,
                format_timestamp(&report.timestamp),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted report with id {}", id);
        Ok(Report {
            id,
            raw: report.raw.clone(),
            product: report.product.clone(),
            version: report.version.clone(),
            timestamp: report.timestamp.trunc_subsecs(6),
        })
    }

    /// Get a report by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Report>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, raw, product, version, timestamp
                FROM reports WHERE id = ?1
                ",
                [id],
                Self::row_to_report,
            )
            .optional()?;
        Ok(result)
    }

    /// Get every report, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Report>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, raw, product, version, timestamp
            FROM reports ORDER BY id ASC
            ",
        )?;

        let reports = stmt
            .query_map([], Self::row_to_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    /// Replace the raw text of a report.
    ///
    /// Returns `true` if a report was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_raw(&self, id: i64, raw: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("UPDATE reports SET raw = ?1 WHERE id = ?2", params![raw, id])?;
        Ok(affected > 0)
    }

    /// Count total reports in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_reports = self.count()?;

        let oldest: Option<String> = self
            .conn
            .query_row(
                "SELECT timestamp FROM reports ORDER BY timestamp ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT timestamp FROM reports ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_reports,
            oldest_report: oldest.as_deref().and_then(parse_timestamp),
            newest_report: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        let id: i64 = row.get(0)?;
        let timestamp_str: String = row.get(4)?;

        let timestamp = parse_timestamp(&timestamp_str).unwrap_or_else(|| {
            warn!(
                "Report {} has unparseable timestamp {:?}, using current time",
                id, timestamp_str
            );
            Utc::now()
        });

        Ok(Report {
            id,
            raw: row.get(1)?,
            product: row.get(2)?,
            version: row.get(3)?,
            timestamp,
        })
    }
}

/// Fixed-width RFC 3339 so that lexical order matches chronological order.
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of reports stored.
    pub total_reports: i64,
    /// Timestamp of the oldest report.
    pub oldest_report: Option<DateTime<Utc>>,
    /// Timestamp of the newest report.
    pub newest_report: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
