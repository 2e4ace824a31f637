//! Durable storage for points and snapshots
//!
//! The query service and the collector only talk to storage through
//! [`MetricStore`].

mod client;
mod local;

pub use client::MetricStore;
pub use local::LocalMetricStore;
