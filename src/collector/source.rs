//! Measurement sources
//!
//! A [`MeasurementSource`] turns "now" into one [`Measurement`]: the KPI
//! snapshot plus the series samples written for that instant. Sources are
//! best-effort. When they cannot observe the chain they say so through
//! [`SampleFailure`], which still carries a usable fallback measurement.

use crate::schema::catalog::{
    DIM_CONTRACT_CALLS, DIM_SYSTEM_MISC, DIM_TRANSFERS, ECONOMICS_BURN_SHARE,
    ECONOMICS_COMPUTE_PRESSURE, ECONOMICS_FEE_MON, ECONOMICS_VALIDATORS_SHARE,
    FEES_AVG_TX_FEE_MON, FEES_FEE_VS_LOAD_PCT, NETWORK_BLOCK_SIZE_MB, NETWORK_TX_PER_BLOCK,
    TX_MIX_COUNT,
};
use crate::schema::{FeeLevel, MetricPoint, Snapshot};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Per-tick series samples, one value per catalog series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSamples {
    pub tx_per_block: f64,
    pub block_size_mb: f64,
    pub avg_tx_fee_mon: f64,
    pub fee_vs_load_pct: f64,
    pub burn_share_pct: f64,
    pub validators_share_pct: f64,
    pub compute_pressure_idx: f64,
    pub econ_fee_mon: f64,
    pub mix_transfers: f64,
    pub mix_contract_calls: f64,
    pub mix_system_misc: f64,
}

/// Everything persisted for one collection instant
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub snapshot: Snapshot,
    pub samples: SeriesSamples,
}

impl Measurement {
    pub fn ts(&self) -> DateTime<Utc> {
        self.snapshot.ts
    }

    /// The eleven points written for this measurement.
    pub fn points(&self) -> Vec<MetricPoint> {
        let ts = self.ts();
        let s = &self.samples;
        vec![
            MetricPoint::new(NETWORK_TX_PER_BLOCK, ts, s.tx_per_block),
            MetricPoint::new(NETWORK_BLOCK_SIZE_MB, ts, s.block_size_mb),
            MetricPoint::new(FEES_AVG_TX_FEE_MON, ts, s.avg_tx_fee_mon),
            MetricPoint::new(FEES_FEE_VS_LOAD_PCT, ts, s.fee_vs_load_pct),
            MetricPoint::new(ECONOMICS_BURN_SHARE, ts, s.burn_share_pct),
            MetricPoint::new(ECONOMICS_VALIDATORS_SHARE, ts, s.validators_share_pct),
            MetricPoint::new(ECONOMICS_COMPUTE_PRESSURE, ts, s.compute_pressure_idx),
            MetricPoint::new(ECONOMICS_FEE_MON, ts, s.econ_fee_mon),
            MetricPoint::new(TX_MIX_COUNT, ts, s.mix_transfers).with_dimension(DIM_TRANSFERS),
            MetricPoint::new(TX_MIX_COUNT, ts, s.mix_contract_calls)
                .with_dimension(DIM_CONTRACT_CALLS),
            MetricPoint::new(TX_MIX_COUNT, ts, s.mix_system_misc).with_dimension(DIM_SYSTEM_MISC),
        ]
    }
}

/// A sample that could not observe the chain.
#[derive(Debug, Clone)]
pub struct SampleFailure {
    pub reason: String,
    /// Measurement to persist instead
    pub fallback: Measurement,
}

impl fmt::Display for SampleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sampling failed: {}", self.reason)
    }
}

/// Source of per-tick measurements
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Take a measurement stamped `at`.
    async fn sample(&self, at: DateTime<Utc>) -> Result<Measurement, SampleFailure>;
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Draw a plausible measurement for `ts`.
pub fn synthesize<R: Rng + ?Sized>(rng: &mut R, ts: DateTime<Utc>) -> Measurement {
    let avg_tx_per_block = rng.gen_range(1800.0..3000.0_f64).round();
    let avg_block_load_pct = rng.gen_range(45.0..92.0_f64).round();
    let avg_block_time_sec = round_to(rng.gen_range(0.9..1.3), 2);
    let peak_load_24h_pct = (avg_block_load_pct + rng.gen_range(5.0..25.0))
        .clamp(0.0, 100.0)
        .round();
    let empty_blocks_24h_pct = round_to(rng.gen_range(0.2..2.2), 2);
    let avg_block_size_mb = round_to(rng.gen_range(3.0..5.8), 2);

    let avg_tx_fee_mon = round_to(rng.gen_range(0.00022..0.00055), 6);
    let median_tx_fee_mon = round_to(avg_tx_fee_mon * rng.gen_range(0.65..0.9), 6);
    let cost_per_block_mon =
        round_to(avg_tx_fee_mon * avg_tx_per_block * rng.gen_range(0.7..1.15), 3);

    let parallel_efficiency_pct = rng.gen_range(65.0..88.0_f64).round();
    let state_conflict_rate_pct = round_to(rng.gen_range(3.0..10.5), 2);
    let effective_tps = rng.gen_range(1400.0..3200.0_f64).round();

    let fee_flow_burn_pct = rng.gen_range(32.0..44.0_f64).round();
    let fee_flow_validators_pct = rng.gen_range(46.0..60.0_f64).round();
    let fee_flow_adjust_pct = (100.0 - fee_flow_burn_pct - fee_flow_validators_pct).max(0.0);

    let simple_transfers_pct = rng.gen_range(35.0..48.0_f64).round();
    let contract_calls_pct = rng.gen_range(40.0..55.0_f64).round();
    let micro_tx_pct = rng.gen_range(45.0..70.0_f64).round();

    let samples = SeriesSamples {
        tx_per_block: avg_tx_per_block,
        block_size_mb: avg_block_size_mb,
        avg_tx_fee_mon,
        fee_vs_load_pct: (avg_block_load_pct + rng.gen_range(-18.0..18.0))
            .clamp(0.0, 100.0)
            .round(),
        burn_share_pct: round_to(rng.gen_range(30.0..42.0), 2),
        validators_share_pct: round_to(rng.gen_range(50.0..62.0), 2),
        compute_pressure_idx: round_to(rng.gen_range(42.0..100.0), 1),
        econ_fee_mon: avg_tx_fee_mon,
        mix_transfers: simple_transfers_pct,
        mix_contract_calls: contract_calls_pct,
        mix_system_misc: (100.0 - simple_transfers_pct - contract_calls_pct).max(0.0),
    };

    let snapshot = Snapshot {
        ts,
        avg_tx_per_block,
        avg_block_load_pct,
        avg_block_time_sec,
        peak_load_24h_pct,
        empty_blocks_24h_pct,
        avg_block_size_mb,
        avg_tx_fee_mon,
        median_tx_fee_mon,
        cost_per_block_mon,
        fee_level_state: FeeLevel::from_avg_fee(avg_tx_fee_mon),
        parallel_efficiency_pct,
        state_conflict_rate_pct,
        effective_tps,
        fee_flow_burn_pct,
        fee_flow_validators_pct,
        fee_flow_adjust_pct,
        simple_transfers_pct,
        contract_calls_pct,
        micro_tx_pct,
    };

    Measurement { snapshot, samples }
}

/// Generates plausible values without touching the network.
pub struct SyntheticSource {
    rng: Mutex<StdRng>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence for tests and fixtures
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(&self, ts: DateTime<Utc>) -> Measurement {
        synthesize(&mut *self.rng.lock(), ts)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeasurementSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn sample(&self, at: DateTime<Utc>) -> Result<Measurement, SampleFailure> {
        Ok(self.generate(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_values_are_consistent() {
        let source = SyntheticSource::seeded(7);
        for _ in 0..200 {
            let m = source.generate(Utc::now());
            let s = &m.snapshot;
            assert!((1800.0..=3000.0).contains(&s.avg_tx_per_block));
            assert!(s.peak_load_24h_pct <= 100.0);
            assert_eq!(
                s.fee_flow_adjust_pct,
                (100.0 - s.fee_flow_burn_pct - s.fee_flow_validators_pct).max(0.0)
            );
            assert_eq!(s.fee_level_state, FeeLevel::from_avg_fee(s.avg_tx_fee_mon));
            assert!(m.samples.mix_system_misc >= 0.0);
            assert_eq!(m.samples.tx_per_block, s.avg_tx_per_block);
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let ts = Utc::now();
        let a = SyntheticSource::seeded(42).generate(ts);
        let b = SyntheticSource::seeded(42).generate(ts);
        assert_eq!(a, b);
    }

    #[test]
    fn test_points_cover_catalog() {
        let m = SyntheticSource::seeded(1).generate(Utc::now());
        let points = m.points();
        assert_eq!(points.len(), 11);
        assert!(points.iter().all(|p| p.timestamp == m.ts()));

        let mix: Vec<&str> = points
            .iter()
            .filter(|p| p.series_key == TX_MIX_COUNT)
            .filter_map(|p| p.dimension.as_deref())
            .collect();
        assert_eq!(mix, vec![DIM_TRANSFERS, DIM_CONTRACT_CALLS, DIM_SYSTEM_MISC]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.0004567, 6), 0.000457);
    }

    #[tokio::test]
    async fn test_synthetic_source_never_fails() {
        let source = SyntheticSource::seeded(3);
        let at = Utc::now();
        let measurement = source.sample(at).await.unwrap();
        assert_eq!(measurement.ts(), at);
    }
}
