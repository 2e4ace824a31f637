//! Query-path telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct QueryInstruments {
    query_requests: Counter<u64>,
    query_duration_seconds: Histogram<f64>,
    points_scanned: Histogram<u64>,
    cache_hits: Counter<u64>,
    cache_misses: Counter<u64>,
}

fn instruments() -> &'static QueryInstruments {
    static INSTRUMENTS: OnceLock<QueryInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("chainpulse.query");
        QueryInstruments {
            query_requests: meter
                .u64_counter("chainpulse.query.requests")
                .with_description("Total query requests by view and outcome")
                .init(),
            query_duration_seconds: meter
                .f64_histogram("chainpulse.query.duration")
                .with_description("Query latency including store reads on cache miss")
                .with_unit("s")
                .init(),
            points_scanned: meter
                .u64_histogram("chainpulse.query.points_scanned")
                .with_description("Points read from the store per recomputed series")
                .init(),
            cache_hits: meter
                .u64_counter("chainpulse.query.cache.hits")
                .with_description("Queries served from the result cache")
                .init(),
            cache_misses: meter
                .u64_counter("chainpulse.query.cache.misses")
                .with_description("Queries that recomputed their result")
                .init(),
        }
    })
}

pub fn record_cache_lookup(view: &'static str, hit: bool) {
    let attrs = [KeyValue::new("view", view)];
    if hit {
        instruments().cache_hits.add(1, &attrs);
    } else {
        instruments().cache_misses.add(1, &attrs);
    }
}

pub fn record_points_scanned(view: &'static str, count: usize) {
    instruments()
        .points_scanned
        .record(count as u64, &[KeyValue::new("view", view)]);
}

pub fn record_query(view: &'static str, outcome: &'static str, duration_seconds: f64) {
    let attrs = [KeyValue::new("view", view), KeyValue::new("outcome", outcome)];
    let i = instruments();
    i.query_requests.add(1, &attrs);
    i.query_duration_seconds.record(duration_seconds, &attrs);
}
