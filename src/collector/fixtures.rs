//! Demo history for an empty store

use super::source::synthesize;
use crate::schema::{FeeLevel, Snapshot};
use crate::store::MetricStore;
use crate::Result;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use tracing::info;

/// What [`seed_history`] wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub instants: usize,
    pub points_inserted: usize,
    pub snapshot_inserted: bool,
}

fn floor_to_step(ts: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let step_ms = step.num_milliseconds();
    let ms = ts.timestamp_millis();
    let floored = ms - ms.rem_euclid(step_ms);
    Utc.timestamp_millis_opt(floored).single().unwrap_or(ts)
}

/// The card values shown before the first live tick lands.
pub fn representative_snapshot(ts: DateTime<Utc>) -> Snapshot {
    Snapshot {
        ts,
        avg_tx_per_block: 2380.0,
        avg_block_load_pct: 64.0,
        avg_block_time_sec: 1.0,
        peak_load_24h_pct: 92.0,
        empty_blocks_24h_pct: 1.3,
        avg_block_size_mb: 4.1,
        avg_tx_fee_mon: 0.00038,
        median_tx_fee_mon: 0.00029,
        cost_per_block_mon: 0.92,
        fee_level_state: FeeLevel::Stable,
        parallel_efficiency_pct: 78.0,
        state_conflict_rate_pct: 6.4,
        effective_tps: 2250.0,
        fee_flow_burn_pct: 38.0,
        fee_flow_validators_pct: 54.0,
        fee_flow_adjust_pct: 8.0,
        simple_transfers_pct: 41.0,
        contract_calls_pct: 46.0,
        micro_tx_pct: 57.0,
    }
}

/// Write every catalog series at `step`-aligned instants across `window`
/// ending at `now`, plus one representative snapshot stamped `now`.
///
/// Existing rows are left alone; duplicates are skipped by the store.
pub async fn seed_history<R>(
    store: &dyn MetricStore,
    now: DateTime<Utc>,
    window: Duration,
    step: Duration,
    rng: &mut R,
) -> Result<SeedReport>
where
    R: Rng + Send + ?Sized,
{
    let mut report = SeedReport {
        instants: 0,
        points_inserted: 0,
        snapshot_inserted: false,
    };

    // Steps under a millisecond cannot be aligned
    if step.num_milliseconds() > 0 {
        let mut t = floor_to_step(now - window, step);
        while t <= now {
            let measurement = synthesize(rng, t);
            report.points_inserted += store.insert_points(&measurement.points()).await?;
            report.instants += 1;
            t += step;
        }
    }

    report.snapshot_inserted = store.insert_snapshot(&representative_snapshot(now)).await?;

    info!(
        instants = report.instants,
        points = report.points_inserted,
        "Seeded demo history"
    );
    Ok(report)
}
