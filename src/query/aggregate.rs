//! Bucket averaging with forward fill
//!
//! Points arrive sorted ascending by timestamp. For each series a single
//! cursor walks the points once while the buckets are visited in order, so
//! the cost is linear in points plus buckets.

use super::buckets::Bucket;
use crate::schema::{MetricPoint, SeriesSpec};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One output series: display key, unit and one value per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesValues {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub values: Vec<f64>,
}

impl SeriesValues {
    fn from_spec(spec: &SeriesSpec, values: Vec<f64>) -> Self {
        Self {
            key: spec.key.to_string(),
            unit: spec.unit.map(str::to_string),
            values,
        }
    }
}

/// Mean of the points in each bucket, `None` where a bucket holds no points.
///
/// `points` must be sorted ascending by timestamp. Points before the first
/// bucket are skipped; points at or after the last bucket end are ignored.
pub fn bucket_average(points: &[&MetricPoint], buckets: &[Bucket]) -> Vec<Option<f64>> {
    let mut cursor = 0;

    buckets
        .iter()
        .map(|bucket| {
            let mut sum = 0.0;
            let mut count = 0usize;

            while let Some(point) = points.get(cursor) {
                if point.timestamp < bucket.start {
                    cursor += 1;
                    continue;
                }
                if point.timestamp >= bucket.end {
                    break;
                }
                sum += point.value;
                count += 1;
                cursor += 1;
            }

            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Replace gaps with the preceding value; a leading gap becomes `0`.
pub fn forward_fill(raw: &[Option<f64>]) -> Vec<f64> {
    let mut filled = Vec::with_capacity(raw.len());
    let mut last = 0.0;
    for value in raw {
        if let Some(v) = value {
            last = *v;
        }
        filled.push(last);
    }
    filled
}

fn averaged(points: &[&MetricPoint], buckets: &[Bucket]) -> Vec<f64> {
    forward_fill(&bucket_average(points, buckets))
}

/// One series per spec, matching points on `series_key == spec.source`.
pub fn aggregate_flat(
    points: &[MetricPoint],
    buckets: &[Bucket],
    specs: &[SeriesSpec],
) -> Vec<SeriesValues> {
    let mut by_key: HashMap<&str, Vec<&MetricPoint>> = HashMap::new();
    for point in points {
        by_key.entry(point.series_key.as_str()).or_default().push(point);
    }

    specs
        .iter()
        .map(|spec| {
            let series = by_key.get(spec.source).map(Vec::as_slice).unwrap_or(&[]);
            SeriesValues::from_spec(spec, averaged(series, buckets))
        })
        .collect()
}

/// One series per dimension of `series_key`, matching on `dimension == spec.source`.
///
/// Points of other series are ignored. Points without a dimension count
/// towards the `"unknown"` dimension.
pub fn aggregate_dimensioned(
    points: &[MetricPoint],
    buckets: &[Bucket],
    series_key: &str,
    dimensions: &[SeriesSpec],
) -> Vec<SeriesValues> {
    let mut by_dimension: HashMap<&str, Vec<&MetricPoint>> = HashMap::new();
    for point in points.iter().filter(|p| p.series_key == series_key) {
        by_dimension
            .entry(point.dimension_or_unknown())
            .or_default()
            .push(point);
    }

    dimensions
        .iter()
        .map(|spec| {
            let series = by_dimension
                .get(spec.source)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            SeriesValues::from_spec(spec, averaged(series, buckets))
        })
        .collect()
}
