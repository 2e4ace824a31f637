//! Record types and the series catalog
//!
//! Points and snapshots are the only durable data. The catalog fixes which
//! series the collector writes and how each dashboard category reads them.

pub mod catalog;
mod metrics;

pub use catalog::{SeriesCategory, SeriesLayout, SeriesSpec};
pub use metrics::{FeeLevel, MetricPoint, Snapshot, UNKNOWN_DIMENSION};
