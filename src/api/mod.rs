//! HTTP API for the dashboard
//!
//! Serves the KPI snapshot and the four time-series categories as JSON,
//! plus liveness and readiness probes.

pub mod dashboard;
mod telemetry;

use crate::query::MetricsQueryService;
use crate::{Error, Result};

use axum::http::HeaderValue;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Allowed CORS origin; `*` allows any
    pub cors_origin: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            cors_origin: "*".to_string(),
        }
    }
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub query: Arc<MetricsQueryService>,
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = origin.trim();
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        let value = HeaderValue::from_str(origin)
            .map_err(|e| Error::Config(format!("invalid CORS_ORIGIN '{origin}': {e}")))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the HTTP API router
pub fn build_http_router(query: Arc<MetricsQueryService>, config: &ApiServerConfig) -> Result<Router> {
    use axum::middleware;
    use axum::routing::get;

    let cors = cors_layer(&config.cors_origin)?;

    Ok(Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(dashboard::health))
        .route("/ready", get(dashboard::ready))

        .route("/api/v1/dashboard/snapshot", get(dashboard::snapshot))
        .route("/api/v1/timeseries/network-load", get(dashboard::network_load))
        .route("/api/v1/timeseries/fees", get(dashboard::fees))
        .route("/api/v1/timeseries/economics", get(dashboard::economics))
        .route("/api/v1/timeseries/tx-composition", get(dashboard::tx_composition))

        .with_state(ApiState { query })
        .layer(middleware::from_fn(telemetry::dashboard_metrics_middleware))
        .layer(cors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_parsing() {
        assert!(cors_layer("*").is_ok());
        assert!(cors_layer("https://dashboard.example.com").is_ok());
        assert!(matches!(cors_layer("bad\norigin"), Err(Error::Config(_))));
    }
}
