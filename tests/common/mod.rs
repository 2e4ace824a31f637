//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chainpulse::clock::{Clock, ManualClock};
use chainpulse::collector::{Measurement, MeasurementSource, SampleFailure, SyntheticSource};
use chainpulse::query::{ExpiringCache, MetricsQueryService, QueryConfig};
use chainpulse::schema::{MetricPoint, Snapshot};
use chainpulse::store::{LocalMetricStore, MetricStore};
use chainpulse::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
}

pub fn query_service(
    store: Arc<dyn MetricStore>,
    clock: Arc<ManualClock>,
) -> Arc<MetricsQueryService> {
    let clock: Arc<dyn Clock> = clock;
    let cache = Arc::new(ExpiringCache::with_clock(
        Duration::from_secs(5),
        Arc::clone(&clock),
    ));
    Arc::new(MetricsQueryService::new(
        store,
        cache,
        clock,
        QueryConfig::default(),
    ))
}

/// Store whose every call fails
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl MetricStore for FailingStore {
    async fn insert_points(&self, _points: &[MetricPoint]) -> Result<usize> {
        Err(Error::Store("insert rejected".to_string()))
    }

    async fn insert_snapshot(&self, _snapshot: &Snapshot) -> Result<bool> {
        Err(Error::Store("insert rejected".to_string()))
    }

    async fn points_since(
        &self,
        _series_keys: &[&str],
        _since: DateTime<Utc>,
    ) -> Result<Vec<MetricPoint>> {
        Err(Error::Store("connection reset".to_string()))
    }

    async fn delete_points_before(&self, _cutoff: DateTime<Utc>) -> Result<u64> {
        Err(Error::Store("delete rejected".to_string()))
    }

    async fn delete_snapshots_before(&self, _cutoff: DateTime<Utc>) -> Result<u64> {
        Err(Error::Store("delete rejected".to_string()))
    }

    async fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        Err(Error::Store("connection reset".to_string()))
    }
}

/// How a [`ScriptedSource`] answers
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    /// Succeed after sleeping on the tokio clock
    Slow(Duration),
}

/// Synthetic source that counts calls and can fail or stall on demand.
pub struct ScriptedSource {
    inner: SyntheticSource,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            inner: SyntheticSource::seeded(17),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeasurementSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn sample(&self, at: DateTime<Utc>) -> std::result::Result<Measurement, SampleFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let measurement = self.inner.generate(at);
        match self.behavior {
            Behavior::Succeed => Ok(measurement),
            Behavior::Fail => Err(SampleFailure {
                reason: "node unreachable".to_string(),
                fallback: measurement,
            }),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(measurement)
            }
        }
    }
}

pub fn local_store() -> Arc<LocalMetricStore> {
    Arc::new(LocalMetricStore::new())
}
