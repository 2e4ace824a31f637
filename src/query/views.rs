//! Response shapes served to dashboard callers

use super::aggregate::SeriesValues;
use super::window::{Step, Window};
use crate::schema::{FeeLevel, Snapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkKpis {
    pub avg_tx_per_block: f64,
    pub avg_block_load_pct: f64,
    pub avg_block_time_sec: f64,
    pub peak_load24h_pct: f64,
    pub empty_blocks24h_pct: f64,
    pub avg_block_size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeKpis {
    pub avg_tx_fee_mon: f64,
    pub median_tx_fee_mon: f64,
    pub cost_per_block_mon: f64,
    pub fee_level_state: FeeLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeFlow {
    pub burn_pct: f64,
    pub validators_pct: f64,
    pub adjust_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicsKpis {
    pub parallel_efficiency_pct: f64,
    pub state_conflict_rate_pct: f64,
    pub effective_tps: f64,
    pub fee_flow: FeeFlow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxCompositionKpis {
    pub simple_transfers_pct: f64,
    pub contract_calls_pct: f64,
    pub micro_tx_pct: f64,
}

/// Latest KPI snapshot grouped the way the dashboard cards read it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub ts: DateTime<Utc>,
    pub network: NetworkKpis,
    pub fees: FeeKpis,
    pub economics: EconomicsKpis,
    pub tx_composition: TxCompositionKpis,
}

impl SnapshotView {
    /// Well-formed view for a store that holds no snapshot yet
    pub fn empty(ts: DateTime<Utc>) -> Self {
        Self::from(&Snapshot::empty(ts))
    }
}

impl From<&Snapshot> for SnapshotView {
    fn from(s: &Snapshot) -> Self {
        Self {
            ts: s.ts,
            network: NetworkKpis {
                avg_tx_per_block: s.avg_tx_per_block,
                avg_block_load_pct: s.avg_block_load_pct,
                avg_block_time_sec: s.avg_block_time_sec,
                peak_load24h_pct: s.peak_load_24h_pct,
                empty_blocks24h_pct: s.empty_blocks_24h_pct,
                avg_block_size_mb: s.avg_block_size_mb,
            },
            fees: FeeKpis {
                avg_tx_fee_mon: s.avg_tx_fee_mon,
                median_tx_fee_mon: s.median_tx_fee_mon,
                cost_per_block_mon: s.cost_per_block_mon,
                fee_level_state: s.fee_level_state,
            },
            economics: EconomicsKpis {
                parallel_efficiency_pct: s.parallel_efficiency_pct,
                state_conflict_rate_pct: s.state_conflict_rate_pct,
                effective_tps: s.effective_tps,
                fee_flow: FeeFlow {
                    burn_pct: s.fee_flow_burn_pct,
                    validators_pct: s.fee_flow_validators_pct,
                    adjust_pct: s.fee_flow_adjust_pct,
                },
            },
            tx_composition: TxCompositionKpis {
                simple_transfers_pct: s.simple_transfers_pct,
                contract_calls_pct: s.contract_calls_pct,
                micro_tx_pct: s.micro_tx_pct,
            },
        }
    }
}

/// Bucketized series for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub window: Window,
    pub step: Step,
    pub labels: Vec<String>,
    pub series: Vec<SeriesValues>,
}
