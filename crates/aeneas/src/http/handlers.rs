//! Request handlers for the `/v1.0/reports` resource.
//!
//! Handlers only translate between HTTP and [`ReportService`]; all decisions
//! about admission, validation and representation are made by the service.
//!
//! [`ReportService`]: crate::service::ReportService

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::header::{
    AsHeaderName, ACCEPT, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, VARY,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::admission::AdmissionFilter;
use crate::error::Error;
use crate::negotiation::Representation;
use crate::render::REPORTS_PATH;
use crate::service::{Rendered, Submission};

use super::error::{AppError, AppResult};
use super::AppState;

/// Header set by a trusted reverse proxy to the original client address.
pub const X_REAL_IP: &str = "x-real-ip";

fn header_str(headers: &HeaderMap, name: impl AsHeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Buffer at most one byte past the admission limit.
async fn read_body(body: Body, admission: &AdmissionFilter) -> AppResult<Bytes> {
    let read_limit = admission.read_limit();
    match Limited::new(body, read_limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(Error::PayloadTooLarge {
                size: u64::try_from(read_limit).unwrap_or(u64::MAX),
                limit: admission.limit(),
            }
            .into())
        }
        Err(err) => Err(AppError::BodyRead(err.to_string())),
    }
}

fn negotiated(rendered: Rendered) -> Response {
    (
        [
            (CONTENT_TYPE, rendered.representation.content_type()),
            (VARY, "accept"),
        ],
        rendered.body,
    )
        .into_response()
}

/// `POST /v1.0/reports`
pub async fn submit_report(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Response> {
    let admission = *state.service.admission();
    let declared =
        header_str(request.headers(), CONTENT_LENGTH).and_then(|v| v.trim().parse().ok());
    admission.admit_declared(declared)?;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    let body = read_body(body, &admission).await?;

    let report = state
        .service
        .submit(Submission {
            content_type: header_str(&parts.headers, CONTENT_TYPE),
            body: &body,
            real_ip: header_str(&parts.headers, X_REAL_IP),
            peer,
        })
        .await?;

    let location = format!("{REPORTS_PATH}/{}", report.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)]).into_response())
}

/// `GET /v1.0/reports`
pub async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let rendered = state.service.list(header_str(&headers, ACCEPT)).await?;
    Ok(negotiated(rendered))
}

/// `GET /v1.0/reports/{id}`
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let rendered = state.service.get(&id, header_str(&headers, ACCEPT)).await?;
    Ok(negotiated(rendered))
}

/// `GET /v1.0/reports/{id}/download`
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let report = state.service.download(&id).await?;
    let disposition = format!("attachment; filename=\"report-{}.json\"", report.id);
    Ok((
        [
            (CONTENT_TYPE, Representation::Json.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        report.raw,
    )
        .into_response())
}

/// `GET /v1.0/reports/clean-up-all`
pub async fn clean_up_all(State(state): State<AppState>) -> AppResult<Redirect> {
    state.service.clean_up_all().await?;
    Ok(Redirect::to(REPORTS_PATH))
}
