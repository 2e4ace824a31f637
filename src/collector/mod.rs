//! Scheduled metric collector
//!
//! The collector is responsible for:
//! - Sampling a measurement immediately at start and then every poll interval
//! - Persisting one snapshot and the series points for each tick
//! - Sweeping rows older than the retention horizon once a day
//! - Skipping a tick while the previous one is still running
//!
//! Ticks and sweeps run as their own tasks, so a slow store never delays the
//! timers. Failures are logged and never stop the loop.

mod fixtures;
mod rpc;
mod source;
mod telemetry;

pub use fixtures::{representative_snapshot, seed_history, SeedReport};
pub use rpc::{parse_hex_quantity, RpcBlock, RpcCall, RpcClient, RpcProbeSource};
pub use source::{
    synthesize, Measurement, MeasurementSource, SampleFailure, SeriesSamples, SyntheticSource,
};

use crate::clock::Clock;
use crate::store::MetricStore;
use crate::{Error, Result};

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Time between sampling ticks
    pub poll_interval: Duration,
    /// Rows older than this many days are swept
    pub retention_days: u32,
    /// Time between retention sweeps; the first one fires one interval after start
    pub sweep_interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(15_000),
            retention_days: 14,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(Error::Config("sweep interval must be positive".to_string()));
        }
        Ok(())
    }
}

/// Outcome of one sampling tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub ts: DateTime<Utc>,
    /// False when the source failed and its fallback was persisted
    pub sampled_live: bool,
    pub snapshot_written: bool,
    pub points_written: usize,
    pub took: Duration,
}

/// Outcome of one retention sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionReport {
    pub cutoff: DateTime<Utc>,
    pub points_deleted: u64,
    pub snapshots_deleted: u64,
}

/// Clears the in-flight flag when the tick task ends, panics included.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Collector service
pub struct Collector {
    config: CollectorConfig,
    store: Arc<dyn MetricStore>,
    source: Arc<dyn MeasurementSource>,
    clock: Arc<dyn Clock>,
    /// Set while a sampling tick is running
    in_flight: AtomicBool,
    stopped: AtomicBool,
    /// Cancellation token for graceful shutdown
    shutdown: CancellationToken,
}

impl Collector {
    pub fn new(
        config: CollectorConfig,
        store: Arc<dyn MetricStore>,
        source: Arc<dyn MeasurementSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            source,
            clock,
            in_flight: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Get a cancellation token that can be used to trigger graceful shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Whether a sampling tick is currently running
    pub fn is_tick_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stop scheduling work. Safe to call any number of times; a tick that is
    /// already running is left to finish.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!("Collector stop requested");
        }
        self.shutdown.cancel();
    }

    /// Run the service loop on a new task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run().await })
    }

    /// Run the main service loop. Returns once stopped, or immediately
    /// (stopped) when the configuration is invalid.
    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.config.validate() {
            error!(error = %e, "Collector not started");
            self.stop();
            return;
        }

        let mut sample_timer = tokio::time::interval(self.config.poll_interval);
        let mut sweep_timer = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.sweep_interval,
            self.config.sweep_interval,
        );

        info!(
            source = self.source.name(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            retention_days = self.config.retention_days,
            "Collector started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Collector shutting down gracefully");
                    break;
                }
                _ = sample_timer.tick() => self.spawn_tick(),
                _ = sweep_timer.tick() => self.spawn_sweep(),
            }
        }
    }

    fn spawn_tick(self: &Arc<Self>) {
        if self.is_stopped() {
            return;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Previous poll cycle still running, skipping tick");
            telemetry::record_skipped_tick();
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = InFlight(&this.in_flight);
            if let Err(e) = this.tick().await {
                error!(error = %e, "Poll cycle failed");
            }
        });
    }

    fn spawn_sweep(self: &Arc<Self>) {
        if self.is_stopped() {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.sweep_retention().await {
                error!(error = %e, "Retention sweep failed");
            }
        });
    }

    /// Sample once and persist the result.
    ///
    /// A failed sample is not an error: its fallback measurement is written
    /// instead. Store failures abandon the tick and are returned.
    pub async fn tick(&self) -> Result<TickReport> {
        let started = Instant::now();
        let ts = self.clock.now();

        let (measurement, sampled_live) = match self.source.sample(ts).await {
            Ok(measurement) => (measurement, true),
            Err(failure) => {
                warn!(
                    source = self.source.name(),
                    reason = %failure.reason,
                    "Sampling failed (non-fatal), continuing with fallback measurement"
                );
                telemetry::record_sample_fallback(self.source.name());
                (failure.fallback, false)
            }
        };

        let persisted = self.persist(&measurement).await;
        let took = started.elapsed();

        let (snapshot_written, points_written) = match persisted {
            Ok(written) => written,
            Err(e) => {
                telemetry::record_tick("persist_failed", took.as_secs_f64());
                return Err(e);
            }
        };
        telemetry::record_tick("success", took.as_secs_f64());
        telemetry::record_points_written(points_written);

        info!(
            took_ms = took.as_millis() as u64,
            ts = %measurement.ts().to_rfc3339(),
            live = sampled_live,
            "Poll cycle complete"
        );

        Ok(TickReport {
            ts: measurement.ts(),
            sampled_live,
            snapshot_written,
            points_written,
            took,
        })
    }

    async fn persist(&self, measurement: &Measurement) -> Result<(bool, usize)> {
        let snapshot_written = self.store.insert_snapshot(&measurement.snapshot).await?;
        let points_written = self.store.insert_points(&measurement.points()).await?;
        Ok((snapshot_written, points_written))
    }

    /// Delete points and snapshots older than the retention horizon.
    pub async fn sweep_retention(&self) -> Result<RetentionReport> {
        let cutoff = self.clock.retention_cutoff(self.config.retention_days);

        let (points_deleted, snapshots_deleted) = tokio::try_join!(
            self.store.delete_points_before(cutoff),
            self.store.delete_snapshots_before(cutoff),
        )?;
        telemetry::record_retention(points_deleted, snapshots_deleted);

        info!(
            cutoff = %cutoff.to_rfc3339(),
            metric_points_deleted = points_deleted,
            snapshots_deleted,
            "Retention sweep complete"
        );

        Ok(RetentionReport {
            cutoff,
            points_deleted,
            snapshots_deleted,
        })
    }
}
