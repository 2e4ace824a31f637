//! Bucket aggregation throughput benchmark

use chainpulse::query::{aggregate_dimensioned, aggregate_flat, build_buckets};
use chainpulse::schema::catalog::TX_MIX_COUNT;
use chainpulse::schema::{MetricPoint, SeriesCategory, SeriesLayout};

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// One point per series per `every` seconds over the last `hours`.
fn history(category: SeriesCategory, hours: i64, every: i64) -> Vec<MetricPoint> {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let start = now - Duration::hours(hours);
    let ticks = hours * 3600 / every;

    let mut points = Vec::new();
    for i in 0..ticks {
        let ts = start + Duration::seconds(i * every);
        match category.layout() {
            SeriesLayout::Flat(specs) => {
                for spec in specs {
                    points.push(MetricPoint::new(spec.source, ts, (i % 100) as f64));
                }
            }
            SeriesLayout::Dimensioned { dimensions, .. } => {
                for dim in dimensions {
                    points.push(
                        MetricPoint::new(TX_MIX_COUNT, ts, (i % 50) as f64).with_dimension(dim.source),
                    );
                }
            }
        }
    }
    points
}

fn benchmark_flat_aggregation(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let mut group = c.benchmark_group("aggregate_flat");

    for (label, hours, step) in [
        ("24h/2h", 24, Duration::hours(2)),
        ("24h/15m", 24, Duration::minutes(15)),
        ("7d/1h", 24 * 7, Duration::hours(1)),
    ] {
        let points = history(SeriesCategory::Economics, hours, 15);
        let buckets = build_buckets(now, Duration::hours(hours), step).buckets;
        let SeriesLayout::Flat(specs) = SeriesCategory::Economics.layout() else {
            unreachable!("economics is a flat category");
        };

        group.throughput(Throughput::Elements(points.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &points, |b, points| {
            b.iter(|| black_box(aggregate_flat(points, &buckets, specs)))
        });
    }

    group.finish();
}

fn benchmark_dimensioned_aggregation(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let points = history(SeriesCategory::TxComposition, 24, 15);
    let buckets = build_buckets(now, Duration::hours(24), Duration::minutes(30)).buckets;
    let SeriesLayout::Dimensioned { series_key, dimensions } = SeriesCategory::TxComposition.layout()
    else {
        unreachable!("tx composition is dimensioned");
    };

    let mut group = c.benchmark_group("aggregate_dimensioned");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("24h/30m", |b| {
        b.iter(|| black_box(aggregate_dimensioned(&points, &buckets, series_key, dimensions)))
    });
    group.finish();
}

criterion_group!(benches, benchmark_flat_aggregation, benchmark_dimensioned_aggregation);
criterion_main!(benches);
