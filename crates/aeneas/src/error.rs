//! Error types for aeneas.
//!
//! This module defines all error types used throughout the aeneas crate:
//! the request taxonomy produced while admitting, validating and serving
//! reports, and the infrastructure failures of storage and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for aeneas operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    /// The request body is larger than the configured maximum.
    #[error("payload too large: {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Observed (or declared) body size in bytes.
        size: u64,
        /// Configured maximum body size in bytes.
        limit: u64,
    },

    /// The declared content type is not `application/json`.
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// The content type the client declared.
        content_type: String,
    },

    /// The body could not be decoded as a JSON object.
    #[error("malformed JSON: {message}")]
    MalformedJson {
        /// Description of the decoding failure.
        message: String,
    },

    /// A required field is absent from the report.
    #[error("no {field} specified")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong JSON type.
    #[error("{field} is wrong type")]
    WrongFieldType {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The client-supplied timestamp could not be parsed.
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The unparseable value.
        value: String,
    },

    /// No supported representation satisfies the client's `Accept` header.
    #[error("no acceptable representation")]
    NotAcceptable,

    /// No report exists with the requested id.
    #[error("report {id} not found")]
    NotFound {
        /// The requested report id.
        id: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization of stored data failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for aeneas operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a malformed JSON error.
    #[must_use]
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::MalformedJson {
            message: message.into(),
        }
    }

    /// Create a not found error for the given id.
    #[must_use]
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Check if this error was caused by the client's request rather than
    /// by the service or its store.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PayloadTooLarge { .. }
                | Self::UnsupportedMediaType { .. }
                | Self::MalformedJson { .. }
                | Self::MissingField { .. }
                | Self::WrongFieldType { .. }
                | Self::InvalidTimestamp { .. }
                | Self::NotAcceptable
                | Self::NotFound { .. }
        )
    }

    /// Check if this error means the requested report does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
