//! `aeneas` - A crash and diagnostic report intake service
//!
//! Client applications POST JSON reports naming their `product` and
//! `version`. Each accepted report is size-checked, validated, stamped with
//! its origin address and id, and stored in `SQLite`; stored reports are
//! served back as JSON or HTML depending on the client's `Accept` header.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod admission;
pub mod cli;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod logging;
pub mod negotiation;
pub mod render;
pub mod report;
pub mod repository;
pub mod server;
pub mod service;
pub mod storage;
pub mod validation;

pub use admission::AdmissionFilter;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use negotiation::{negotiate, Representation};
pub use report::{NewReport, Report, ReportPayload};
pub use repository::{ReportRepository, SqliteReportRepository};
pub use service::{CleanupSummary, ReportService, Submission};
pub use storage::{Storage, StorageStats};
pub use validation::ReportValidator;
