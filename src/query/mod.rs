//! Query service for dashboard views
//!
//! The query service is responsible for:
//! - Serving the latest KPI snapshot, with a zeroed fallback on an empty store
//! - Building buckets for a window/step and averaging stored points into them
//! - Fronting both with a short-lived result cache

mod aggregate;
mod buckets;
mod cache;
mod telemetry;
mod views;
mod window;

pub use aggregate::{
    aggregate_dimensioned, aggregate_flat, bucket_average, forward_fill, SeriesValues,
};
pub use buckets::{build_buckets, Bucket, BucketSet};
pub use cache::{CacheStats, ExpiringCache};
pub use views::{
    EconomicsKpis, FeeFlow, FeeKpis, NetworkKpis, SeriesResponse, SnapshotView,
    TxCompositionKpis,
};
pub use window::{Step, Window};

use crate::clock::Clock;
use crate::schema::{SeriesCategory, SeriesLayout};
use crate::store::MetricStore;
use crate::Result;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key of the snapshot view
pub const SNAPSHOT_CACHE_KEY: &str = "snapshot";

/// Configuration for the query service
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Cache TTL when a caller does not give one
    pub default_ttl: Duration,
    /// Snapshot view TTL
    pub snapshot_ttl: Duration,
    /// Network, fees and economics series TTL
    pub series_ttl: Duration,
    /// Transaction composition series TTL
    pub composition_ttl: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5),
            snapshot_ttl: Duration::from_secs(2),
            series_ttl: Duration::from_secs(5),
            composition_ttl: Duration::from_secs(10),
        }
    }
}

impl QueryConfig {
    pub fn ttl_for(&self, category: SeriesCategory) -> Duration {
        match category {
            SeriesCategory::TxComposition => self.composition_ttl,
            _ => self.series_ttl,
        }
    }
}

/// Values held by the result cache
#[derive(Debug, Clone)]
pub enum CachedView {
    Snapshot(Arc<SnapshotView>),
    Series(Arc<SeriesResponse>),
}

/// Cache key for a series query
pub fn series_cache_key(category: SeriesCategory, window: Window, step: Step) -> String {
    format!("series:{}:{}:{}", category.cache_tag(), window, step)
}

/// Read side of the system: snapshot and series views over the store.
///
/// Results are cached per `(view, parameters)` for a few seconds. Concurrent
/// misses on the same key may each hit the store; results are idempotent so
/// the last writer simply wins.
pub struct MetricsQueryService {
    store: Arc<dyn MetricStore>,
    cache: Arc<ExpiringCache<CachedView>>,
    clock: Arc<dyn Clock>,
    config: QueryConfig,
}

impl MetricsQueryService {
    pub fn new(
        store: Arc<dyn MetricStore>,
        cache: Arc<ExpiringCache<CachedView>>,
        clock: Arc<dyn Clock>,
        config: QueryConfig,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            config,
        }
    }

    /// The result cache backing this service
    pub fn cache(&self) -> &Arc<ExpiringCache<CachedView>> {
        &self.cache
    }

    /// Latest KPI snapshot.
    ///
    /// An empty store yields a zeroed view with fee level `unknown`; that
    /// fallback is cached like a real result.
    pub async fn snapshot(&self) -> Result<Arc<SnapshotView>> {
        if let Some(CachedView::Snapshot(view)) = self.cache.get(SNAPSHOT_CACHE_KEY) {
            telemetry::record_cache_lookup("snapshot", true);
            return Ok(view);
        }
        telemetry::record_cache_lookup("snapshot", false);

        let started = Instant::now();
        let latest = self.store.latest_snapshot().await;
        let elapsed = started.elapsed().as_secs_f64();

        let view = match latest {
            Ok(Some(snapshot)) => SnapshotView::from(&snapshot),
            Ok(None) => {
                debug!("No snapshot stored yet, serving empty view");
                SnapshotView::empty(self.clock.now())
            }
            Err(e) => {
                telemetry::record_query("snapshot", "error", elapsed);
                return Err(e);
            }
        };
        telemetry::record_query("snapshot", "success", elapsed);

        let view = Arc::new(view);
        self.cache.set(
            SNAPSHOT_CACHE_KEY,
            CachedView::Snapshot(view.clone()),
            Some(self.config.snapshot_ttl),
        );
        Ok(view)
    }

    /// Bucketized, forward-filled series for `category` over `window`.
    pub async fn series(
        &self,
        category: SeriesCategory,
        window: Window,
        step: Step,
    ) -> Result<Arc<SeriesResponse>> {
        let key = series_cache_key(category, window, step);
        let view = category.cache_tag();

        if let Some(CachedView::Series(response)) = self.cache.get(&key) {
            telemetry::record_cache_lookup(view, true);
            return Ok(response);
        }
        telemetry::record_cache_lookup(view, false);

        let started = Instant::now();
        let result = self.compute_series(category, window, step).await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => {
                telemetry::record_query(view, "success", elapsed);
                Arc::new(response)
            }
            Err(e) => {
                telemetry::record_query(view, "error", elapsed);
                return Err(e);
            }
        };

        self.cache.set(
            key,
            CachedView::Series(response.clone()),
            Some(self.config.ttl_for(category)),
        );
        Ok(response)
    }

    async fn compute_series(
        &self,
        category: SeriesCategory,
        window: Window,
        step: Step,
    ) -> Result<SeriesResponse> {
        let now = self.clock.now();
        let BucketSet { buckets, labels } =
            build_buckets(now, window.duration(), step.duration());
        let since = now - window.duration();

        let points = self
            .store
            .points_since(&category.series_keys(), since)
            .await?;
        telemetry::record_points_scanned(category.cache_tag(), points.len());

        let series = match category.layout() {
            SeriesLayout::Flat(specs) => aggregate_flat(&points, &buckets, specs),
            SeriesLayout::Dimensioned {
                series_key,
                dimensions,
            } => aggregate_dimensioned(&points, &buckets, series_key, dimensions),
        };

        debug!(
            category = %category,
            window = %window,
            step = %step,
            buckets = buckets.len(),
            points = points.len(),
            "Series recomputed"
        );

        Ok(SeriesResponse {
            window,
            step,
            labels,
            series,
        })
    }

    pub async fn network_load_series(&self, window: Window, step: Step) -> Result<Arc<SeriesResponse>> {
        self.series(SeriesCategory::NetworkLoad, window, step).await
    }

    pub async fn fees_series(&self, window: Window, step: Step) -> Result<Arc<SeriesResponse>> {
        self.series(SeriesCategory::Fees, window, step).await
    }

    pub async fn economics_series(&self, window: Window, step: Step) -> Result<Arc<SeriesResponse>> {
        self.series(SeriesCategory::Economics, window, step).await
    }

    pub async fn tx_composition_series(
        &self,
        window: Window,
        step: Step,
    ) -> Result<Arc<SeriesResponse>> {
        self.series(SeriesCategory::TxComposition, window, step).await
    }

    /// Uncached round trip to the store, for readiness probes.
    pub async fn ping_store(&self) -> Result<()> {
        self.store.latest_snapshot().await.map(|_| ())
    }

    /// Result cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_cache_keys() {
        assert_eq!(
            series_cache_key(SeriesCategory::Economics, Window::SixHours, Step::ThirtyMinutes),
            "series:econ:6h:30m"
        );
        assert_eq!(
            series_cache_key(SeriesCategory::TxComposition, Window::OneDay, Step::TwoHours),
            "series:txc:24h:2h"
        );
    }

    #[test]
    fn test_composition_ttl_is_longer() {
        let config = QueryConfig::default();
        assert_eq!(config.ttl_for(SeriesCategory::Fees), Duration::from_secs(5));
        assert_eq!(
            config.ttl_for(SeriesCategory::TxComposition),
            Duration::from_secs(10)
        );
    }
}
