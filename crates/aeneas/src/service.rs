//! Report ingestion and retrieval.
//!
//! [`ReportService`] composes the admission filter, validator, enricher and
//! negotiator into the operations exposed over HTTP. It holds no mutable
//! state of its own; every read goes to the repository.

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::admission::AdmissionFilter;
use crate::enrichment::{backfill_id, origin_ip, ReportEnricher};
use crate::error::{Error, Result};
use crate::negotiation::{negotiate, Representation};
use crate::render;
use crate::report::Report;
use crate::repository::ReportRepository;
use crate::validation::ReportValidator;

/// The parts of a submission request the pipeline looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct Submission<'a> {
    /// Declared `Content-Type` header.
    pub content_type: Option<&'a str>,
    /// Raw request body.
    pub body: &'a [u8],
    /// `X-Real-IP` header set by a trusted proxy.
    pub real_ip: Option<&'a str>,
    /// Address of the directly connected peer.
    pub peer: Option<IpAddr>,
}

/// A response body in a negotiated representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The representation chosen.
    pub representation: Representation,
    /// The response body.
    pub body: String,
}

/// Outcome of a bulk clean-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Rows looked at.
    pub examined: usize,
    /// Rows whose raw text was rewritten.
    pub repaired: usize,
    /// Rows left alone because their raw text is not a JSON object.
    pub skipped: usize,
}

/// Orchestrates report submission, retrieval and maintenance.
#[derive(Clone)]
pub struct ReportService {
    admission: AdmissionFilter,
    validator: ReportValidator,
    enricher: ReportEnricher,
    repository: Arc<dyn ReportRepository>,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("admission", &self.admission)
            .finish_non_exhaustive()
    }
}

impl ReportService {
    /// Create a service over `repository` that admits bodies of at most
    /// `max_content_length` bytes.
    #[must_use]
    pub fn new(repository: Arc<dyn ReportRepository>, max_content_length: u64) -> Self {
        Self {
            admission: AdmissionFilter::new(max_content_length),
            validator: ReportValidator::new(),
            enricher: ReportEnricher::new(Arc::clone(&repository)),
            repository,
        }
    }

    /// The admission filter guarding submissions.
    #[must_use]
    pub fn admission(&self) -> &AdmissionFilter {
        &self.admission
    }

    /// Admit, validate, enrich and store a submitted report.
    ///
    /// # Errors
    ///
    /// Returns the first admission or validation failure without storing
    /// anything, or a storage error.
    pub async fn submit(&self, submission: Submission<'_>) -> Result<Report> {
        self.admission.admit_body(submission.body)?;
        let payload = self
            .validator
            .validate(submission.content_type, submission.body)?;

        let origin = origin_ip(submission.real_ip, submission.peer);
        let report = self.enricher.enrich(payload, &origin).await?;

        info!(
            id = report.id,
            product = %report.product,
            version = %report.version,
            origin = %origin,
            "Report submitted"
        );
        Ok(report)
    }

    /// Render every report in the representation the client prefers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAcceptable`] if negotiation fails, or a storage error.
    pub async fn list(&self, accept: Option<&str>) -> Result<Rendered> {
        let representation = negotiate(accept)?;
        let reports = self.repository.list().await?;
        debug!(count = reports.len(), %representation, "Listing reports");

        let body = match representation {
            Representation::Json => {
                let payloads = reports
                    .iter()
                    .map(Report::decode)
                    .collect::<serde_json::Result<Vec<Value>>>()?;
                serde_json::to_string(&payloads)?
            }
            Representation::Html => render::render_list(&reports),
        };

        Ok(Rendered {
            representation,
            body,
        })
    }

    /// Render one report in the representation the client prefers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAcceptable`] if negotiation fails,
    /// [`Error::NotFound`] if there is no such report, or a storage error.
    pub async fn get(&self, id: &str, accept: Option<&str>) -> Result<Rendered> {
        let representation = negotiate(accept)?;
        let report = self.fetch(id).await?;

        let body = match representation {
            Representation::Json => report.raw,
            Representation::Html => render::render_report(&report),
        };

        Ok(Rendered {
            representation,
            body,
        })
    }

    /// Fetch a report's stored raw text exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such report, or a storage error.
    pub async fn download(&self, id: &str) -> Result<Report> {
        self.fetch(id).await
    }

    /// Rewrite every report so its raw text carries its own id.
    ///
    /// Safe to repeat: a second run finds nothing to repair.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails. Rows whose raw text
    /// is not a JSON object are counted as skipped.
    pub async fn clean_up_all(&self) -> Result<CleanupSummary> {
        let mut summary = CleanupSummary::default();

        for report in self.repository.list().await? {
            summary.examined += 1;
            match backfill_id(&report.raw, report.id) {
                Err(err) => {
                    warn!(id = report.id, error = %err, "Skipping report whose raw text is not JSON");
                    summary.skipped += 1;
                }
                Ok(None) => {
                    warn!(id = report.id, "Skipping report whose raw text is not an object");
                    summary.skipped += 1;
                }
                Ok(Some(raw)) if raw == report.raw => {}
                Ok(Some(raw)) => {
                    debug!(id = report.id, "Repairing report raw text");
                    self.repository.update(report.id, raw).await?;
                    summary.repaired += 1;
                }
            }
        }

        info!(
            examined = summary.examined,
            repaired = summary.repaired,
            skipped = summary.skipped,
            "Clean-up finished"
        );
        Ok(summary)
    }

    async fn fetch(&self, id: &str) -> Result<Report> {
        let Ok(numeric) = id.parse::<i64>() else {
            return Err(Error::not_found(id));
        };
        self.repository
            .get(numeric)
            .await?
            .ok_or_else(|| Error::not_found(numeric))
    }
}
