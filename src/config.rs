//! Component factory for environment-based configuration
//!
//! Builds the metric store and the measurement source from configuration,
//! so the binary can switch between a live chain probe and fully synthetic
//! sampling without code changes.

use crate::collector::{MeasurementSource, RpcClient, RpcProbeSource, SyntheticSource};
use crate::store::{LocalMetricStore, MetricStore};
use crate::{Error, Result};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Which measurement source feeds the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerKind {
    Synthetic,
    #[default]
    Rpc,
}

impl SamplerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthetic => "synthetic",
            Self::Rpc => "rpc",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Ok(Self::Synthetic),
            "rpc" => Ok(Self::Rpc),
            other => Err(Error::Config(format!(
                "Unknown SAMPLER: {}. Use 'synthetic' or 'rpc'",
                other
            ))),
        }
    }
}

/// Measurement source configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub kind: SamplerKind,
    /// JSON-RPC endpoint probed by the `rpc` sampler
    pub rpc_url: String,
    /// Per-request timeout for the probe
    pub rpc_timeout: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            kind: SamplerKind::default(),
            rpc_url: "https://rpc.monad.xyz".to_string(),
            rpc_timeout: Duration::from_millis(10_000),
        }
    }
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create the metric store from environment
    ///
    /// Environment variables:
    /// - STORE_BACKEND: "memory" (default)
    pub fn create_store() -> Result<Arc<dyn MetricStore>> {
        let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        Self::create_store_for(&backend)
    }

    pub fn create_store_for(backend: &str) -> Result<Arc<dyn MetricStore>> {
        match backend {
            "memory" => {
                info!("Using in-memory metric store");
                Ok(Arc::new(LocalMetricStore::new()))
            }
            _ => Err(Error::Config(format!(
                "Unknown STORE_BACKEND: {}. Use 'memory'",
                backend
            ))),
        }
    }

    /// Create the measurement source for the collector
    pub fn create_source(config: &SamplerConfig) -> Arc<dyn MeasurementSource> {
        match config.kind {
            SamplerKind::Synthetic => {
                info!("Using synthetic measurement source");
                Arc::new(SyntheticSource::new())
            }
            SamplerKind::Rpc => {
                info!(
                    rpc_url = %config.rpc_url,
                    timeout_ms = config.rpc_timeout.as_millis() as u64,
                    "Using RPC probe measurement source"
                );
                let client = RpcClient::new(config.rpc_url.clone(), config.rpc_timeout);
                Arc::new(RpcProbeSource::new(client))
            }
        }
    }
}
