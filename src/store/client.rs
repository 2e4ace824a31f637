//! Metric store trait

use crate::schema::{MetricPoint, Snapshot};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Metric store interface
///
/// Abstracts the persistent point and snapshot tables so the collector and
/// the query service can run against a relational backend in production and
/// the in-memory [`LocalMetricStore`](super::LocalMetricStore) in development
/// and tests. Both tables are append-only; implementations provide their own
/// row-level atomicity and callers add no locking on top.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Insert a batch of points, silently skipping any whose identity
    /// `(series_key, dimension, timestamp)` already exists.
    ///
    /// Returns the number of points actually inserted.
    async fn insert_points(&self, points: &[MetricPoint]) -> Result<usize>;

    /// Insert a snapshot unless one already exists for its timestamp.
    ///
    /// Returns `false` when the write was a no-op.
    async fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool>;

    /// Points of the given series with `timestamp >= since`, ascending by timestamp.
    async fn points_since(
        &self,
        series_keys: &[&str],
        since: DateTime<Utc>,
    ) -> Result<Vec<MetricPoint>>;

    /// Delete points with `timestamp < cutoff`, returning the number removed.
    async fn delete_points_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Delete snapshots with `ts < cutoff`, returning the number removed.
    async fn delete_snapshots_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Most recent snapshot, if any
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>>;
}
