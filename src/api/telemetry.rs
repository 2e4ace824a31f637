//! Dashboard request metrics.
//!
//! Every request is counted by route and outcome. Time-series requests also
//! carry their category and the resolved window/step, so a 7d/15m view can be
//! told apart from the default 24h/2h one.

use super::dashboard::SeriesParams;
use crate::schema::SeriesCategory;

use axum::extract::{MatchedPath, Query};
use axum::http::{Request, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

const SERIES_ROUTE_PREFIX: &str = "/api/v1/timeseries/";

/// Route label for requests no route matched
const UNMATCHED_ROUTE: &str = "unmatched";

struct DashboardInstruments {
    requests: Counter<u64>,
    duration_seconds: Histogram<f64>,
    rejected_params: Counter<u64>,
}

fn instruments() -> &'static DashboardInstruments {
    static INSTRUMENTS: OnceLock<DashboardInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("chainpulse.api");
        DashboardInstruments {
            requests: meter
                .u64_counter("chainpulse.api.requests")
                .with_description("Dashboard API requests by route and outcome")
                .init(),
            duration_seconds: meter
                .f64_histogram("chainpulse.api.request.duration")
                .with_description("Dashboard API request duration")
                .with_unit("s")
                .init(),
            rejected_params: meter
                .u64_counter("chainpulse.api.params.rejected")
                .with_description("Time-series requests refused for an unknown window or step")
                .init(),
        }
    })
}

/// How a response is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    NotFound,
    Unavailable,
    Failed,
}

impl Outcome {
    fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => Outcome::Ok,
            StatusCode::NOT_FOUND => Outcome::NotFound,
            StatusCode::SERVICE_UNAVAILABLE => Outcome::Unavailable,
            s if s.is_client_error() => Outcome::Rejected,
            _ => Outcome::Failed,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Rejected => "rejected",
            Outcome::NotFound => "not_found",
            Outcome::Unavailable => "unavailable",
            Outcome::Failed => "failed",
        }
    }
}

/// Category, window and step of a time-series request.
///
/// `None` for other routes. Window and step read `"invalid"` when the query
/// string would be refused by the handler.
fn series_labels(route: &str, uri: &Uri) -> Option<[KeyValue; 3]> {
    let category = SeriesCategory::from_route_slug(route.strip_prefix(SERIES_ROUTE_PREFIX)?)?;
    let resolved = Query::<SeriesParams>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.resolve().ok());

    let (window, step) = match resolved {
        Some((window, step)) => (window.as_str(), step.as_str()),
        None => ("invalid", "invalid"),
    };
    Some([
        KeyValue::new("series.category", category.cache_tag()),
        KeyValue::new("series.window", window),
        KeyValue::new("series.step", step),
    ])
}

/// Records request count, duration and outcome per matched dashboard route.
pub async fn dashboard_metrics_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let series = series_labels(&route, req.uri());

    let span = info_span!("dashboard.request", route = %route);
    let response = next.run(req).instrument(span).await;
    let elapsed = start.elapsed().as_secs_f64();
    let outcome = Outcome::from_status(response.status());

    let mut attrs = vec![
        KeyValue::new("http.route", route.clone()),
        KeyValue::new("outcome", outcome.as_str()),
    ];
    if let Some(labels) = series {
        attrs.extend(labels);
    }

    let instruments = instruments();
    instruments.requests.add(1, &attrs);
    instruments.duration_seconds.record(elapsed, &attrs);
    if outcome == Outcome::Rejected && route.starts_with(SERIES_ROUTE_PREFIX) {
        instruments.rejected_params.add(1, &attrs);
    }

    debug!(route = %route, outcome = outcome.as_str(), elapsed_ms = elapsed * 1000.0, "Request served");
    response
}
