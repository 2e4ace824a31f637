//! Dashboard HTTP handlers
//!
//! Thin adapters over [`MetricsQueryService`](crate::query::MetricsQueryService):
//! parse the query string, call the service, render JSON.

use crate::api::ApiState;
use crate::query::{Step, Window};
use crate::schema::SeriesCategory;
use crate::Error;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

/// `?window=&step=` for the time-series routes
#[derive(Debug, Default, Deserialize)]
pub struct SeriesParams {
    pub window: Option<String>,
    pub step: Option<String>,
}

impl SeriesParams {
    /// Validated window and step, defaulting to `24h` and `2h`.
    pub fn resolve(&self) -> Result<(Window, Step), ApiError> {
        let window = match self.window.as_deref() {
            Some(raw) => raw.parse::<Window>().map_err(ApiError::bad_request)?,
            None => Window::default(),
        };
        let step = match self.step.as_deref() {
            Some(raw) => raw.parse::<Step>().map_err(ApiError::bad_request)?,
            None => Step::default(),
        };
        Ok((window, step))
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Error response for the dashboard routes.
///
/// Only rejected query parameters are a client error; anything the query
/// service returns, whatever its kind, is a server error.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Service(Error),
}

impl ApiError {
    fn bad_request(e: Error) -> Self {
        match e {
            Error::Config(msg) => Self::BadRequest(msg),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            Self::Service(e) => {
                error!(error = %e, "Dashboard query failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

/// Current KPI snapshot for the dashboard cards
pub async fn snapshot(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let view = state.query.snapshot().await?;
    Ok(Json(view.as_ref()).into_response())
}

async fn series(
    state: ApiState,
    category: SeriesCategory,
    params: SeriesParams,
) -> Result<Response, ApiError> {
    let (window, step) = params.resolve()?;
    let response = state.query.series(category, window, step).await?;
    Ok(Json(response.as_ref()).into_response())
}

pub async fn network_load(
    State(state): State<ApiState>,
    Query(params): Query<SeriesParams>,
) -> Result<Response, ApiError> {
    series(state, SeriesCategory::NetworkLoad, params).await
}

pub async fn fees(
    State(state): State<ApiState>,
    Query(params): Query<SeriesParams>,
) -> Result<Response, ApiError> {
    series(state, SeriesCategory::Fees, params).await
}

pub async fn economics(
    State(state): State<ApiState>,
    Query(params): Query<SeriesParams>,
) -> Result<Response, ApiError> {
    series(state, SeriesCategory::Economics, params).await
}

pub async fn tx_composition(
    State(state): State<ApiState>,
    Query(params): Query<SeriesParams>,
) -> Result<Response, ApiError> {
    series(state, SeriesCategory::TxComposition, params).await
}

/// Liveness
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Readiness: the store answers a read.
pub async fn ready(State(state): State<ApiState>) -> Response {
    match state.query.ping_store().await {
        Ok(()) => Json(serde_json::json!({ "ok": true, "store": "up" })).into_response(),
        Err(e) => {
            error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "ok": false, "store": "down" })),
            )
                .into_response()
        }
    }
}

pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "api": "/api/v1",
    }))
}
