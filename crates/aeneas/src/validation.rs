//! Report validation.
//!
//! Checks, in this order: declared content type, JSON decoding, `product`,
//! `version`, then the optional `timestamp`. The first failure wins, so a
//! body with several problems always reports the same one.
//!
//! The content type check compares only the media type essence, ignoring
//! ASCII case and any parameters, so `application/json; charset=utf-8` is
//! accepted. `product` and `version` must be non-empty strings; an empty
//! string is reported as missing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::report::ReportPayload;

/// The only media type accepted for submissions.
pub const JSON_MEDIA_TYPE: &str = "application/json";

const PRODUCT: &str = "product";
const VERSION: &str = "version";
const TIMESTAMP: &str = "timestamp";

/// Naive formats accepted for client timestamps, read as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Validates submitted report bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportValidator;

impl ReportValidator {
    /// Create a validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a request's declared content type and body.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedMediaType`] unless the content type is `application/json`
    /// - [`Error::MalformedJson`] if the body is not a JSON object
    /// - [`Error::MissingField`] / [`Error::WrongFieldType`] for `product`, then `version`
    /// - [`Error::WrongFieldType`] / [`Error::InvalidTimestamp`] for a bad `timestamp`
    pub fn validate(&self, content_type: Option<&str>, body: &[u8]) -> Result<ReportPayload> {
        check_content_type(content_type)?;

        let value: Value =
            serde_json::from_slice(body).map_err(|e| Error::malformed_json(e.to_string()))?;
        let Value::Object(body) = value else {
            return Err(Error::malformed_json("report must be a JSON object"));
        };

        let product = required_string(&body, PRODUCT)?;
        let version = required_string(&body, VERSION)?;
        let timestamp = optional_timestamp(&body)?;

        Ok(ReportPayload {
            body,
            product,
            version,
            timestamp,
        })
    }
}

fn check_content_type(content_type: Option<&str>) -> Result<()> {
    let declared = content_type.unwrap_or_default();
    let essence = declared.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE) {
        Ok(())
    } else {
        Err(Error::UnsupportedMediaType {
            content_type: content_type.map_or_else(|| "none".to_string(), str::to_string),
        })
    }
}

fn required_string(body: &Map<String, Value>, field: &'static str) -> Result<String> {
    match body.get(field) {
        None => Err(Error::MissingField { field }),
        Some(Value::String(s)) if s.is_empty() => Err(Error::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::WrongFieldType { field }),
    }
}

fn optional_timestamp(body: &Map<String, Value>) -> Result<Option<DateTime<Utc>>> {
    match body.get(TIMESTAMP) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::InvalidTimestamp { value: s.clone() }),
        Some(_) => Err(Error::WrongFieldType { field: TIMESTAMP }),
    }
}

/// Parse a client timestamp: RFC 3339, or a naive date-time taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}
