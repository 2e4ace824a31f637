//! JSON-RPC probe of the chain head
//!
//! [`RpcClient`] speaks JSON-RPC 2.0 batches over HTTP. [`RpcProbeSource`]
//! uses it to read the latest block and folds what it sees into an otherwise
//! synthetic measurement.

use super::source::{round_to, Measurement, MeasurementSource, SampleFailure, SyntheticSource};
use crate::{Error, Result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const BYTES_PER_MB: f64 = 1_000_000.0;

/// One call of a batch
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Value,
}

impl RpcCall {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self { method, params }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Block header fields read by the probe, all hex quantities as sent on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcBlock {
    pub number: Option<String>,
    pub timestamp: Option<String>,
    pub transactions: Option<Vec<Value>>,
    pub size: Option<String>,
}

impl RpcBlock {
    pub fn tx_count(&self) -> Option<usize> {
        self.transactions.as_ref().map(Vec::len)
    }

    pub fn size_mb(&self) -> Option<f64> {
        self.size
            .as_deref()
            .and_then(parse_hex_quantity)
            .map(|bytes| bytes as f64 / BYTES_PER_MB)
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_hex_quantity(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Minimal JSON-RPC 2.0 client
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `calls` as one batch and return the results in call order.
    ///
    /// Ids are assigned `1..=n`. Responses may arrive in any order. Any
    /// error object in the batch fails the whole call.
    pub async fn batch<T: DeserializeOwned>(&self, calls: &[RpcCall]) -> Result<Vec<Option<T>>> {
        let requests: Vec<JsonRpcRequest<'_>> = calls
            .iter()
            .enumerate()
            .map(|(idx, call)| JsonRpcRequest {
                jsonrpc: "2.0",
                id: idx as u64 + 1,
                method: call.method,
                params: &call.params,
            })
            .collect();

        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&requests)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(400).collect();
            return Err(Error::Probe(format!("HTTP {}: {}", status.as_u16(), snippet)));
        }

        let mut responses: Vec<JsonRpcResponse> = response.json().await?;
        responses.sort_by_key(|r| r.id.unwrap_or(u64::MAX));

        let mut results = Vec::with_capacity(calls.len());
        for r in responses {
            if let Some(err) = r.error {
                return Err(Error::Probe(format!("RPC error {}: {}", err.code, err.message)));
            }
            let value = match r.result {
                Some(Value::Null) | None => None,
                Some(v) => Some(serde_json::from_value(v)?),
            };
            results.push(value);
        }
        Ok(results)
    }

    /// `eth_getBlockByNumber("latest", true)`
    pub async fn get_latest_block(&self) -> Result<Option<RpcBlock>> {
        self.get_block_by_number("latest").await
    }

    pub async fn get_block_by_number(&self, tag: &str) -> Result<Option<RpcBlock>> {
        let call = RpcCall::new("eth_getBlockByNumber", serde_json::json!([tag, true]));
        let results = self.batch::<RpcBlock>(std::slice::from_ref(&call)).await?;
        Ok(results.into_iter().next().flatten())
    }
}

/// Samples the chain head and overlays it on a synthetic baseline.
pub struct RpcProbeSource {
    client: RpcClient,
    baseline: SyntheticSource,
}

impl RpcProbeSource {
    pub fn new(client: RpcClient) -> Self {
        Self::with_baseline(client, SyntheticSource::new())
    }

    pub fn with_baseline(client: RpcClient, baseline: SyntheticSource) -> Self {
        Self { client, baseline }
    }
}

/// Overwrite the measurement fields a single block can answer for.
fn overlay(measurement: &mut Measurement, block: &RpcBlock) {
    if let Some(count) = block.tx_count() {
        let count = count as f64;
        measurement.snapshot.avg_tx_per_block = count;
        measurement.samples.tx_per_block = count;
    }
    if let Some(size_mb) = block.size_mb() {
        let size_mb = round_to(size_mb, 2);
        measurement.snapshot.avg_block_size_mb = size_mb;
        measurement.samples.block_size_mb = size_mb;
    }
}

#[async_trait]
impl MeasurementSource for RpcProbeSource {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn sample(&self, at: DateTime<Utc>) -> std::result::Result<Measurement, SampleFailure> {
        let mut measurement = self.baseline.generate(at);

        match self.client.get_latest_block().await {
            Ok(Some(block)) => {
                debug!(
                    number = block.number.as_deref().unwrap_or("?"),
                    txs = block.tx_count().unwrap_or(0),
                    "Probed latest block"
                );
                overlay(&mut measurement, &block);
                Ok(measurement)
            }
            Ok(None) => Err(SampleFailure {
                reason: "node returned no latest block".to_string(),
                fallback: measurement,
            }),
            Err(e) => Err(SampleFailure {
                reason: e.to_string(),
                fallback: measurement,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x0"), Some(0));
        assert_eq!(parse_hex_quantity("0x1f4"), Some(500));
        assert_eq!(parse_hex_quantity("0X10"), Some(16));
        assert_eq!(parse_hex_quantity("0x"), None);
        assert_eq!(parse_hex_quantity("1f4"), None);
        assert_eq!(parse_hex_quantity("0xzz"), None);
    }

    #[test]
    fn test_block_decoding() {
        let block: RpcBlock = serde_json::from_value(serde_json::json!({
            "number": "0x10",
            "size": "0x3d0900",
            "transactions": [{"hash": "0x1"}, {"hash": "0x2"}],
            "gasUsed": "0x0"
        }))
        .unwrap();

        assert_eq!(block.tx_count(), Some(2));
        assert_eq!(block.size_mb(), Some(4.0));
    }

    #[test]
    fn test_overlay_replaces_observed_fields_only() {
        let baseline = SyntheticSource::seeded(11).generate(Utc::now());
        let mut measurement = baseline.clone();
        let block = RpcBlock {
            transactions: Some(vec![Value::Null; 7]),
            size: Some("0x1e8480".to_string()),
            ..Default::default()
        };

        overlay(&mut measurement, &block);

        assert_eq!(measurement.snapshot.avg_tx_per_block, 7.0);
        assert_eq!(measurement.samples.tx_per_block, 7.0);
        assert_eq!(measurement.samples.block_size_mb, 2.0);
        assert_eq!(measurement.snapshot.avg_tx_fee_mon, baseline.snapshot.avg_tx_fee_mon);
    }

    #[test]
    fn test_overlay_without_fields_is_noop() {
        let baseline = SyntheticSource::seeded(12).generate(Utc::now());
        let mut measurement = baseline.clone();
        overlay(&mut measurement, &RpcBlock::default());
        assert_eq!(measurement, baseline);
    }
}
