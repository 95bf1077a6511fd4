//! Core report types for aeneas.
//!
//! A [`Report`] is the single persisted entity: one client-submitted
//! diagnostic payload together with the fields indexed out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the report's own id is written into its raw text.
pub const ID_KEY: &str = "id";

/// Key under which the observed client address is written into its raw text.
pub const REMOTE_IP_KEY: &str = "server_remote_ip";

/// A stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Identifier assigned by the repository at creation time.
    pub id: i64,

    /// Canonical JSON text of the report payload.
    pub raw: String,

    /// Product the report was filed against.
    pub product: String,

    /// Product version the report was filed against.
    pub version: String,

    /// When the report was created (or the client-supplied time).
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Decode the stored raw text.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw text is not valid JSON.
    pub fn decode(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.raw)
    }
}

/// A report that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    /// Canonical JSON text to store.
    pub raw: String,
    /// Product name.
    pub product: String,
    /// Product version.
    pub version: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

/// A decoded payload that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPayload {
    /// The full decoded object, including `product` and `version`.
    pub body: Map<String, Value>,
    /// Extracted product name.
    pub product: String,
    /// Extracted product version.
    pub version: String,
    /// Client-supplied timestamp, if any.
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReportPayload {
    /// The time to record for this report.
    #[must_use]
    pub fn timestamp_or_now(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }
}
