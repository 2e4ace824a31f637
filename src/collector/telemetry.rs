//! Collector telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct CollectorInstruments {
    ticks: Counter<u64>,
    tick_duration_seconds: Histogram<f64>,
    sample_fallbacks: Counter<u64>,
    points_written: Counter<u64>,
    retention_deleted: Counter<u64>,
}

fn instruments() -> &'static CollectorInstruments {
    static INSTRUMENTS: OnceLock<CollectorInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("chainpulse.collector");
        CollectorInstruments {
            ticks: meter
                .u64_counter("chainpulse.collector.ticks")
                .with_description("Sampling ticks by outcome")
                .init(),
            tick_duration_seconds: meter
                .f64_histogram("chainpulse.collector.tick.duration")
                .with_description("Time spent sampling and persisting one tick")
                .with_unit("s")
                .init(),
            sample_fallbacks: meter
                .u64_counter("chainpulse.collector.sample_fallbacks")
                .with_description("Ticks persisted from a fallback measurement")
                .init(),
            points_written: meter
                .u64_counter("chainpulse.collector.points_written")
                .with_description("Metric points inserted by the collector")
                .init(),
            retention_deleted: meter
                .u64_counter("chainpulse.collector.retention.deleted")
                .with_description("Rows removed by retention sweeps")
                .init(),
        }
    })
}

pub fn record_tick(outcome: &'static str, duration_seconds: f64) {
    let i = instruments();
    let attrs = [KeyValue::new("outcome", outcome)];
    i.ticks.add(1, &attrs);
    i.tick_duration_seconds.record(duration_seconds, &attrs);
}

pub fn record_skipped_tick() {
    instruments()
        .ticks
        .add(1, &[KeyValue::new("outcome", "skipped")]);
}

pub fn record_sample_fallback(source: &'static str) {
    instruments()
        .sample_fallbacks
        .add(1, &[KeyValue::new("source", source)]);
}

pub fn record_points_written(count: usize) {
    instruments().points_written.add(count as u64, &[]);
}

pub fn record_retention(points: u64, snapshots: u64) {
    let i = instruments();
    i.retention_deleted
        .add(points, &[KeyValue::new("table", "metric_points")]);
    i.retention_deleted
        .add(snapshots, &[KeyValue::new("table", "snapshots")]);
}
