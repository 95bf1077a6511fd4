//! HTTP surface of the report service.
//!
//! Provides [`build_router`] so both the server and the integration tests
//! use the exact same routes and middleware stack.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::http::{HeaderName, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::render::REPORTS_PATH;
use crate::service::ReportService;

pub use error::{AppError, AppResult};

/// Shared application state available to all handlers via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The report service.
    pub service: Arc<ReportService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create state for `service` under `config`.
    #[must_use]
    pub fn new(service: ReportService, config: ServerConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

/// Routes of the `/v1.0/reports` resource, without middleware.
#[must_use]
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route(
            REPORTS_PATH,
            get(handlers::list_reports).post(handlers::submit_report),
        )
        .route(
            &format!("{REPORTS_PATH}/clean-up-all"),
            get(handlers::clean_up_all),
        )
        .route(&format!("{REPORTS_PATH}/{{id}}"), get(handlers::get_report))
        .route(
            &format!("{REPORTS_PATH}/{{id}}/download"),
            get(handlers::download_report),
        )
}

/// Build the full application [`Router`] with all middleware layers.
///
/// The middleware stack is applied bottom-up:
///
/// 1. Set request ID on incoming requests
/// 2. Structured request/response tracing
/// 3. Propagate request ID to response
/// 4. Request timeout
/// 5. Panic recovery (catch panics, return 500)
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let timeout = state.config.request_timeout();

    report_routes()
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
