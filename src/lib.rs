//! # chainpulse
//!
//! Collects network, fee and economics metrics for a chain on a fixed
//! cadence and serves them to a dashboard as KPI snapshots and
//! bucketized, gap-filled time series.
//!
//! ## Architecture
//!
//! - **Collector**: samples a measurement every poll interval, persists a
//!   snapshot plus series points, and sweeps expired rows daily
//! - **Store**: append-only point and snapshot tables behind [`store::MetricStore`]
//! - **Query service**: averages points into window/step buckets with
//!   forward fill, fronted by a short-lived expiring cache
//! - **API**: axum routes over the query service

pub mod api;
pub mod clock;
pub mod collector;
pub mod config;
pub mod query;
pub mod schema;
pub mod store;
pub mod telemetry;

mod error;

pub use error::{Error, Result};

/// Configuration for a chainpulse process
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Query service cache TTLs
    pub query: query::QueryConfig,
    /// Sampling cadence and retention
    pub collector: collector::CollectorConfig,
    /// Measurement source selection
    pub sampler: config::SamplerConfig,
    /// HTTP server
    pub api: api::ApiServerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.collector.validate()
    }
}

/// Re-exports for convenience
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::collector::{Collector, CollectorConfig, MeasurementSource, SyntheticSource};
    pub use crate::query::{ExpiringCache, MetricsQueryService, QueryConfig, Step, Window};
    pub use crate::schema::{MetricPoint, SeriesCategory, Snapshot};
    pub use crate::store::{LocalMetricStore, MetricStore};
    pub use crate::{Config, Error, Result};
}
