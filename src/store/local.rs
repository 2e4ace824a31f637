//! Local in-memory metric store for development and testing

use super::MetricStore;
use crate::schema::{MetricPoint, Snapshot};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

/// Point identity, ordered by timestamp first so range scans come out ascending.
type PointKey = (DateTime<Utc>, String, Option<String>);

/// Local in-memory metric store
///
/// Suitable for development, tests and single-node demos. Both tables are
/// `BTreeMap`s keyed by record identity, which gives duplicate suppression,
/// ordered range scans and cheap threshold deletes via `split_off`.
#[derive(Debug, Default)]
pub struct LocalMetricStore {
    points: RwLock<BTreeMap<PointKey, f64>>,
    snapshots: RwLock<BTreeMap<DateTime<Utc>, Snapshot>>,
}

impl LocalMetricStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored points
    pub fn point_count(&self) -> usize {
        self.points.read().len()
    }

    /// Total number of stored snapshots
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Smallest key with the given timestamp
    fn lower_bound(ts: DateTime<Utc>) -> PointKey {
        (ts, String::new(), None)
    }
}

#[async_trait]
impl MetricStore for LocalMetricStore {
    async fn insert_points(&self, points: &[MetricPoint]) -> Result<usize> {
        let mut table = self.points.write();
        let mut inserted = 0;
        for point in points {
            let key = (
                point.timestamp,
                point.series_key.clone(),
                point.dimension.clone(),
            );
            if let std::collections::btree_map::Entry::Vacant(slot) = table.entry(key) {
                slot.insert(point.value);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool> {
        let mut table = self.snapshots.write();
        if table.contains_key(&snapshot.ts) {
            return Ok(false);
        }
        table.insert(snapshot.ts, snapshot.clone());
        Ok(true)
    }

    async fn points_since(
        &self,
        series_keys: &[&str],
        since: DateTime<Utc>,
    ) -> Result<Vec<MetricPoint>> {
        let wanted: HashSet<&str> = series_keys.iter().copied().collect();
        let table = self.points.read();

        let points = table
            .range(Self::lower_bound(since)..)
            .filter(|((_, key, _), _)| wanted.contains(key.as_str()))
            .map(|((ts, key, dimension), value)| MetricPoint {
                series_key: key.clone(),
                dimension: dimension.clone(),
                timestamp: *ts,
                value: *value,
            })
            .collect();

        Ok(points)
    }

    async fn delete_points_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut table = self.points.write();
        let retained = table.split_off(&Self::lower_bound(cutoff));
        let removed = table.len() as u64;
        *table = retained;
        Ok(removed)
    }

    async fn delete_snapshots_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut table = self.snapshots.write();
        let retained = table.split_off(&cutoff);
        let removed = table.len() as u64;
        *table = retained;
        Ok(removed)
    }

    async fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshots
            .read()
            .last_key_value()
            .map(|(_, snapshot)| snapshot.clone()))
    }
}
