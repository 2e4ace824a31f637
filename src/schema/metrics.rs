//! Stored record types
//!
//! Two append-only tables: timestamped [`MetricPoint`] samples and one
//! [`Snapshot`] of dashboard KPIs per collection tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension assigned to points that were written without one.
pub const UNKNOWN_DIMENSION: &str = "unknown";

/// One timestamped sample of a named, optionally dimensioned series.
///
/// Identity is `(series_key, dimension, timestamp)`. Stores must drop a
/// second write with the same identity rather than overwrite the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub series_key: String,
    pub dimension: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(series_key: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            series_key: series_key.into(),
            dimension: None,
            timestamp,
            value,
        }
    }

    /// Attach a dimension label
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    /// Dimension label, with undimensioned points grouped as `"unknown"`.
    pub fn dimension_or_unknown(&self) -> &str {
        self.dimension.as_deref().unwrap_or(UNKNOWN_DIMENSION)
    }
}

/// Coarse fee pressure classification shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeLevel {
    Stable,
    Elevated,
    Hot,
    /// No data has been collected yet
    Unknown,
}

impl FeeLevel {
    /// Classify an average transaction fee (in MON).
    pub fn from_avg_fee(avg_tx_fee_mon: f64) -> Self {
        if avg_tx_fee_mon < 0.00035 {
            FeeLevel::Stable
        } else if avg_tx_fee_mon < 0.00046 {
            FeeLevel::Elevated
        } else {
            FeeLevel::Hot
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeLevel::Stable => "stable",
            FeeLevel::Elevated => "elevated",
            FeeLevel::Hot => "hot",
            FeeLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FeeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard KPIs captured at a single instant.
///
/// Identity is `ts`. Once written a snapshot never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ts: DateTime<Utc>,

    pub avg_tx_per_block: f64,
    pub avg_block_load_pct: f64,
    pub avg_block_time_sec: f64,
    pub peak_load_24h_pct: f64,
    pub empty_blocks_24h_pct: f64,
    pub avg_block_size_mb: f64,

    pub avg_tx_fee_mon: f64,
    pub median_tx_fee_mon: f64,
    pub cost_per_block_mon: f64,
    pub fee_level_state: FeeLevel,

    pub parallel_efficiency_pct: f64,
    pub state_conflict_rate_pct: f64,
    pub effective_tps: f64,

    pub fee_flow_burn_pct: f64,
    pub fee_flow_validators_pct: f64,
    pub fee_flow_adjust_pct: f64,

    pub simple_transfers_pct: f64,
    pub contract_calls_pct: f64,
    pub micro_tx_pct: f64,
}

impl Snapshot {
    /// A snapshot with every figure zeroed and the fee level unknown.
    pub fn empty(ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            avg_tx_per_block: 0.0,
            avg_block_load_pct: 0.0,
            avg_block_time_sec: 0.0,
            peak_load_24h_pct: 0.0,
            empty_blocks_24h_pct: 0.0,
            avg_block_size_mb: 0.0,
            avg_tx_fee_mon: 0.0,
            median_tx_fee_mon: 0.0,
            cost_per_block_mon: 0.0,
            fee_level_state: FeeLevel::Unknown,
            parallel_efficiency_pct: 0.0,
            state_conflict_rate_pct: 0.0,
            effective_tps: 0.0,
            fee_flow_burn_pct: 0.0,
            fee_flow_validators_pct: 0.0,
            fee_flow_adjust_pct: 0.0,
            simple_transfers_pct: 0.0,
            contract_calls_pct: 0.0,
            micro_tx_pct: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_level_thresholds() {
        assert_eq!(FeeLevel::from_avg_fee(0.00022), FeeLevel::Stable);
        assert_eq!(FeeLevel::from_avg_fee(0.00035), FeeLevel::Elevated);
        assert_eq!(FeeLevel::from_avg_fee(0.00045), FeeLevel::Elevated);
        assert_eq!(FeeLevel::from_avg_fee(0.00046), FeeLevel::Hot);
    }

    #[test]
    fn test_fee_level_serializes_lowercase() {
        let json = serde_json::to_string(&FeeLevel::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn test_undimensioned_point_groups_as_unknown() {
        let now = Utc::now();
        let plain = MetricPoint::new("tx.mix.count", now, 1.0);
        assert_eq!(plain.dimension_or_unknown(), UNKNOWN_DIMENSION);

        let dimensioned = plain.with_dimension("transfers");
        assert_eq!(dimensioned.dimension_or_unknown(), "transfers");
    }
}
