//! `SQLite` schema definitions for aeneas.

/// SQL statement to create the reports table.
///
/// `AUTOINCREMENT` keeps ids monotonic and prevents reuse after deletion.
pub const CREATE_REPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    raw TEXT NOT NULL,
    product TEXT NOT NULL,
    version TEXT NOT NULL,
    timestamp TEXT NOT NULL
)
";

/// Index backing the oldest/newest lookups in `Storage::stats`.
pub const CREATE_TIMESTAMP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reports_timestamp ON reports(timestamp)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";
