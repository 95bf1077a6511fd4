//! Report enrichment.
//!
//! An accepted payload is stamped with the client address, persisted, and
//! then rewritten with its own id once the repository has assigned one.
//! The two writes are not atomic: if the second fails the row keeps a raw
//! text without `id` until [`backfill_id`] is applied to it (see
//! `ReportService::clean_up_all`).

use std::net::IpAddr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::report::{NewReport, Report, ReportPayload, ID_KEY, REMOTE_IP_KEY};
use crate::repository::ReportRepository;

/// Recorded when neither a forwarded header nor a peer address is known.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Determine the client address for a request.
///
/// Prefers the proxy-supplied `X-Real-IP` value (first entry, trimmed) and
/// falls back to the direct peer address.
#[must_use]
pub fn origin_ip(real_ip_header: Option<&str>, peer: Option<IpAddr>) -> String {
    real_ip_header
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string())
}

/// Decode `raw`, set its `id` key to `id` and re-serialize it.
///
/// Returns `Ok(None)` when `raw` decodes to something other than an object.
///
/// # Errors
///
/// Returns an error if `raw` is not valid JSON.
pub fn backfill_id(raw: &str, id: i64) -> Result<Option<String>> {
    let Value::Object(mut object) = serde_json::from_str::<Value>(raw)? else {
        return Ok(None);
    };
    object.insert(ID_KEY.to_string(), Value::from(id));
    Ok(Some(serde_json::to_string(&object)?))
}

/// Adds server-observed metadata to accepted reports and persists them.
#[derive(Clone)]
pub struct ReportEnricher {
    repository: Arc<dyn ReportRepository>,
}

impl std::fmt::Debug for ReportEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportEnricher").finish_non_exhaustive()
    }
}

impl ReportEnricher {
    /// Create an enricher writing to `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn ReportRepository>) -> Self {
        Self { repository }
    }

    /// Stamp, persist and back-fill the id of an accepted report.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails. A failure of the second write
    /// leaves a stored row whose raw text lacks its `id`.
    pub async fn enrich(&self, payload: ReportPayload, origin: &str) -> Result<Report> {
        let timestamp = payload.timestamp_or_now();
        let ReportPayload {
            mut body,
            product,
            version,
            ..
        } = payload;

        body.insert(REMOTE_IP_KEY.to_string(), Value::from(origin));
        let raw = serde_json::to_string(&body)?;

        let mut report = self
            .repository
            .create(NewReport {
                raw,
                product,
                version,
                timestamp,
            })
            .await?;
        debug!(id = report.id, "Stored report, back-filling id");

        let enriched = backfill_id(&report.raw, report.id)?
            .ok_or_else(|| Error::internal("stored report is not a JSON object"))?;

        if let Err(err) = self.repository.update(report.id, enriched.clone()).await {
            warn!(
                id = report.id,
                error = %err,
                "Report stored without its id; run clean-up to repair"
            );
            return Err(err);
        }

        report.raw = enriched;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteReportRepository;
    use crate::validation::ReportValidator;
    use std::net::Ipv4Addr;

    /// Repository whose updates always fail.
    struct FailingUpdates(SqliteReportRepository);

    #[async_trait::async_trait]
    impl ReportRepository for FailingUpdates {
        async fn create(&self, report: NewReport) -> Result<Report> {
            self.0.create(report).await
        }
        async fn get(&self, id: i64) -> Result<Option<Report>> {
            self.0.get(id).await
        }
        async fn list(&self) -> Result<Vec<Report>> {
            self.0.list().await
        }
        async fn update(&self, _id: i64, _raw: String) -> Result<()> {
            Err(Error::internal("store went away"))
        }
    }

    fn payload(body: &str) -> ReportPayload {
        ReportValidator::new()
            .validate(Some("application/json"), body.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_origin_prefers_real_ip_header() {
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(origin_ip(Some("203.0.113.9"), peer), "203.0.113.9");
        assert_eq!(origin_ip(Some(" 203.0.113.9 , 10.0.0.2"), peer), "203.0.113.9");
    }

    #[test]
    fn test_origin_falls_back_to_peer() {
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(origin_ip(None, peer), "10.0.0.1");
        assert_eq!(origin_ip(Some("  "), peer), "10.0.0.1");
    }

    #[test]
    fn test_origin_unknown() {
        assert_eq!(origin_ip(None, None), UNKNOWN_ORIGIN);
    }

    #[test]
    fn test_backfill_id() {
        let raw = backfill_id(r#"{"product":"a"}"#, 12).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], Value::from(12));
        assert_eq!(value["product"], Value::from("a"));
    }

    #[test]
    fn test_backfill_id_overwrites_wrong_id() {
        let raw = backfill_id(r#"{"id":99}"#, 3).unwrap().unwrap();
        assert_eq!(raw, r#"{"id":3}"#);
    }

    #[test]
    fn test_backfill_id_non_object() {
        assert!(backfill_id("[1,2]", 3).unwrap().is_none());
        assert!(backfill_id("nope", 3).is_err());
    }

    #[tokio::test]
    async fn test_enrich_injects_id_and_origin() {
        let repo = Arc::new(SqliteReportRepository::open_in_memory().unwrap());
        let enricher = ReportEnricher::new(repo.clone());

        let report = enricher
            .enrich(payload(r#"{"product": "a", "version": "1.0", "data": "x"}"#), "192.0.2.1")
            .await
            .unwrap();

        let stored = repo.get(report.id).await.unwrap().unwrap();
        assert_eq!(stored.raw, report.raw);

        let value = stored.decode().unwrap();
        assert_eq!(value["id"], Value::from(report.id));
        assert_eq!(value["server_remote_ip"], Value::from("192.0.2.1"));
        assert_eq!(value["data"], Value::from("x"));
        assert_eq!(stored.product, "a");
        assert_eq!(stored.version, "1.0");
    }

    #[tokio::test]
    async fn test_enrich_uses_client_timestamp() {
        let repo = Arc::new(SqliteReportRepository::open_in_memory().unwrap());
        let enricher = ReportEnricher::new(repo);

        let report = enricher
            .enrich(
                payload(r#"{"product": "a", "version": "1", "timestamp": "2019-05-06T07:08:09Z"}"#),
                "192.0.2.1",
            )
            .await
            .unwrap();

        assert_eq!(report.timestamp.to_rfc3339(), "2019-05-06T07:08:09+00:00");
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_row_without_id() {
        let inner = SqliteReportRepository::open_in_memory().unwrap();
        let enricher = ReportEnricher::new(Arc::new(FailingUpdates(inner.clone())));

        let result = enricher
            .enrich(payload(r#"{"product": "a", "version": "1"}"#), "192.0.2.1")
            .await;
        assert!(result.is_err());

        let rows = inner.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        let value = rows[0].decode().unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["server_remote_ip"], Value::from("192.0.2.1"));
    }
}
