//! Fixed series catalog
//!
//! Which series keys the collector writes and how each query category
//! presents them.

use std::fmt;

pub const NETWORK_TX_PER_BLOCK: &str = "network.tx_per_block";
pub const NETWORK_BLOCK_SIZE_MB: &str = "network.block_size_mb";
pub const FEES_AVG_TX_FEE_MON: &str = "fees.avg_tx_fee_mon";
pub const FEES_FEE_VS_LOAD_PCT: &str = "fees.fee_vs_load_pct";
pub const ECONOMICS_BURN_SHARE: &str = "economics.burn_share";
pub const ECONOMICS_VALIDATORS_SHARE: &str = "economics.validators_share";
pub const ECONOMICS_COMPUTE_PRESSURE: &str = "economics.compute_pressure";
pub const ECONOMICS_FEE_MON: &str = "economics.fee_mon";
pub const TX_MIX_COUNT: &str = "tx.mix.count";

pub const DIM_TRANSFERS: &str = "transfers";
pub const DIM_CONTRACT_CALLS: &str = "contract_calls";
pub const DIM_SYSTEM_MISC: &str = "system_misc";

/// Maps a stored series (or a dimension of one) to its display key and unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpec {
    /// Series key, or dimension label for dimensioned layouts
    pub source: &'static str,
    /// Key shown to callers
    pub key: &'static str,
    pub unit: Option<&'static str>,
}

const fn spec(source: &'static str, key: &'static str, unit: &'static str) -> SeriesSpec {
    SeriesSpec {
        source,
        key,
        unit: Some(unit),
    }
}

const NETWORK_SERIES: &[SeriesSpec] = &[
    spec(NETWORK_TX_PER_BLOCK, "tx_per_block", "tx"),
    spec(NETWORK_BLOCK_SIZE_MB, "block_size_mb", "MB"),
];

const FEES_SERIES: &[SeriesSpec] = &[
    spec(FEES_AVG_TX_FEE_MON, "avg_tx_fee_mon", "MON"),
    spec(FEES_FEE_VS_LOAD_PCT, "fee_vs_load_pct", "%"),
];

const ECONOMICS_SERIES: &[SeriesSpec] = &[
    spec(ECONOMICS_BURN_SHARE, "burn_share", "%"),
    spec(ECONOMICS_VALIDATORS_SHARE, "validators_share", "%"),
    spec(ECONOMICS_COMPUTE_PRESSURE, "compute_pressure", "idx"),
    spec(ECONOMICS_FEE_MON, "fee_mon", "MON"),
];

const TX_MIX_DIMENSIONS: &[SeriesSpec] = &[
    spec(DIM_TRANSFERS, "transfers", "%"),
    spec(DIM_CONTRACT_CALLS, "contract_calls", "%"),
    spec(DIM_SYSTEM_MISC, "system_misc", "%"),
];

/// How a category's stored points become output series.
#[derive(Debug, Clone, Copy)]
pub enum SeriesLayout {
    /// One output series per series key
    Flat(&'static [SeriesSpec]),
    /// One output series per dimension of a single series key
    Dimensioned {
        series_key: &'static str,
        dimensions: &'static [SeriesSpec],
    },
}

/// The four query categories served to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesCategory {
    NetworkLoad,
    Fees,
    Economics,
    TxComposition,
}

impl SeriesCategory {
    pub const ALL: [SeriesCategory; 4] = [
        SeriesCategory::NetworkLoad,
        SeriesCategory::Fees,
        SeriesCategory::Economics,
        SeriesCategory::TxComposition,
    ];

    /// Short tag used in cache keys
    pub fn cache_tag(&self) -> &'static str {
        match self {
            SeriesCategory::NetworkLoad => "network",
            SeriesCategory::Fees => "fees",
            SeriesCategory::Economics => "econ",
            SeriesCategory::TxComposition => "txc",
        }
    }

    /// Path segment under `/api/v1/timeseries/`
    pub fn route_slug(&self) -> &'static str {
        match self {
            SeriesCategory::NetworkLoad => "network-load",
            SeriesCategory::Fees => "fees",
            SeriesCategory::Economics => "economics",
            SeriesCategory::TxComposition => "tx-composition",
        }
    }

    pub fn from_route_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.route_slug() == slug)
    }

    pub fn layout(&self) -> SeriesLayout {
        match self {
            SeriesCategory::NetworkLoad => SeriesLayout::Flat(NETWORK_SERIES),
            SeriesCategory::Fees => SeriesLayout::Flat(FEES_SERIES),
            SeriesCategory::Economics => SeriesLayout::Flat(ECONOMICS_SERIES),
            SeriesCategory::TxComposition => SeriesLayout::Dimensioned {
                series_key: TX_MIX_COUNT,
                dimensions: TX_MIX_DIMENSIONS,
            },
        }
    }

    /// Series keys to fetch from the store for this category
    pub fn series_keys(&self) -> Vec<&'static str> {
        match self.layout() {
            SeriesLayout::Flat(specs) => specs.iter().map(|s| s.source).collect(),
            SeriesLayout::Dimensioned { series_key, .. } => vec![series_key],
        }
    }
}

impl fmt::Display for SeriesCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_slugs_round_trip() {
        for category in SeriesCategory::ALL {
            assert_eq!(SeriesCategory::from_route_slug(category.route_slug()), Some(category));
        }
        assert_eq!(SeriesCategory::from_route_slug("gas"), None);
    }

    #[test]
    fn test_catalog_covers_all_written_series() {
        let mut keys: Vec<&str> = SeriesCategory::ALL
            .iter()
            .flat_map(|c| c.series_keys())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&TX_MIX_COUNT));
    }

    #[test]
    fn test_cache_tags_are_distinct() {
        let mut tags: Vec<&str> = SeriesCategory::ALL.iter().map(|c| c.cache_tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), SeriesCategory::ALL.len());
    }

    #[test]
    fn test_composition_is_dimensioned() {
        match SeriesCategory::TxComposition.layout() {
            SeriesLayout::Dimensioned {
                series_key,
                dimensions,
            } => {
                assert_eq!(series_key, TX_MIX_COUNT);
                let dims: Vec<&str> = dimensions.iter().map(|d| d.source).collect();
                assert_eq!(dims, vec![DIM_TRANSFERS, DIM_CONTRACT_CALLS, DIM_SYSTEM_MISC]);
            }
            SeriesLayout::Flat(_) => panic!("tx composition must split by dimension"),
        }
    }
}
