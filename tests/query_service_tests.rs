//! Query service integration tests: caching, bucketing and error paths.

mod common;

use chainpulse::clock::ManualClock;
use chainpulse::query::{Step, Window};
use chainpulse::schema::catalog::{
    DIM_CONTRACT_CALLS, DIM_TRANSFERS, ECONOMICS_BURN_SHARE, FEES_AVG_TX_FEE_MON,
    NETWORK_TX_PER_BLOCK, TX_MIX_COUNT,
};
use chainpulse::schema::{FeeLevel, MetricPoint, Snapshot};
use chainpulse::store::MetricStore;
use chainpulse::Error;
use chrono::Duration;
use common::{fixed_now, local_store, query_service, FailingStore};
use std::sync::Arc;

fn snapshot_at(ts: chrono::DateTime<chrono::Utc>, avg_fee: f64) -> Snapshot {
    Snapshot {
        avg_tx_per_block: 2400.0,
        avg_tx_fee_mon: avg_fee,
        fee_level_state: FeeLevel::from_avg_fee(avg_fee),
        ..Snapshot::empty(ts)
    }
}

#[tokio::test]
async fn test_empty_store_serves_zeroed_snapshot() {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let service = query_service(local_store(), clock);

    let view = service.snapshot().await.unwrap();

    assert_eq!(view.ts, fixed_now());
    assert_eq!(view.network.avg_tx_per_block, 0.0);
    assert_eq!(view.fees.fee_level_state, FeeLevel::Unknown);
    assert_eq!(view.economics.fee_flow.burn_pct, 0.0);
}

#[tokio::test]
async fn test_snapshot_cached_until_ttl_expires() {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let store = local_store();
    let service = query_service(store.clone(), clock.clone());

    let first = service.snapshot().await.unwrap();
    assert_eq!(first.fees.fee_level_state, FeeLevel::Unknown);

    store
        .insert_snapshot(&snapshot_at(fixed_now(), 0.0005))
        .await
        .unwrap();

    // Within the 2s snapshot TTL the empty fallback is still served
    clock.advance(Duration::milliseconds(1500));
    let cached = service.snapshot().await.unwrap();
    assert_eq!(cached.fees.fee_level_state, FeeLevel::Unknown);

    clock.advance(Duration::milliseconds(1000));
    let fresh = service.snapshot().await.unwrap();
    assert_eq!(fresh.fees.fee_level_state, FeeLevel::Hot);
    assert_eq!(fresh.network.avg_tx_per_block, 2400.0);

    let stats = service.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_latest_snapshot_wins() {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let store = local_store();
    store
        .insert_snapshot(&snapshot_at(fixed_now() - Duration::minutes(2), 0.0002))
        .await
        .unwrap();
    store
        .insert_snapshot(&snapshot_at(fixed_now() - Duration::minutes(1), 0.0004))
        .await
        .unwrap();

    let view = query_service(store, clock).snapshot().await.unwrap();
    assert_eq!(view.fees.fee_level_state, FeeLevel::Elevated);
}

#[tokio::test]
async fn test_series_buckets_average_and_fill() {
    let now = fixed_now();
    let clock = Arc::new(ManualClock::new(now));
    let store = local_store();
    store
        .insert_points(&[
            MetricPoint::new(NETWORK_TX_PER_BLOCK, now - Duration::minutes(50), 10.0),
            MetricPoint::new(NETWORK_TX_PER_BLOCK, now - Duration::minutes(40), 20.0),
            // Outside the 1h window
            MetricPoint::new(NETWORK_TX_PER_BLOCK, now - Duration::minutes(90), 999.0),
        ])
        .await
        .unwrap();
    let service = query_service(store.clone(), clock.clone());

    let response = service
        .network_load_series(Window::OneHour, Step::FifteenMinutes)
        .await
        .unwrap();

    // Window 1h / step 15m gives 5 buckets, the last one starting at `now`
    assert_eq!(response.labels.len(), 5);
    assert_eq!(response.series.len(), 2);

    let tx = &response.series[0];
    assert_eq!(tx.key, "tx_per_block");
    assert_eq!(tx.unit.as_deref(), Some("tx"));
    assert_eq!(tx.values, vec![10.0, 20.0, 20.0, 20.0, 20.0]);

    let size = &response.series[1];
    assert_eq!(size.key, "block_size_mb");
    assert_eq!(size.values, vec![0.0; 5]);
}

#[tokio::test]
async fn test_series_recomputed_after_ttl() {
    let now = fixed_now();
    let clock = Arc::new(ManualClock::new(now));
    let store = local_store();
    store
        .insert_points(&[
            MetricPoint::new(NETWORK_TX_PER_BLOCK, now - Duration::minutes(50), 10.0),
            MetricPoint::new(NETWORK_TX_PER_BLOCK, now - Duration::minutes(40), 20.0),
        ])
        .await
        .unwrap();
    let service = query_service(store.clone(), clock.clone());

    let first = service
        .network_load_series(Window::OneHour, Step::FifteenMinutes)
        .await
        .unwrap();

    store
        .insert_points(&[MetricPoint::new(
            NETWORK_TX_PER_BLOCK,
            now - Duration::minutes(5),
            50.0,
        )])
        .await
        .unwrap();

    clock.advance(Duration::seconds(4));
    let cached = service
        .network_load_series(Window::OneHour, Step::FifteenMinutes)
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    clock.advance(Duration::seconds(2));
    let fresh = service
        .network_load_series(Window::OneHour, Step::FifteenMinutes)
        .await
        .unwrap();
    assert_eq!(fresh.series[0].values, vec![10.0, 20.0, 20.0, 50.0, 50.0]);
}

#[tokio::test]
async fn test_parameters_are_cached_independently() {
    let now = fixed_now();
    let clock = Arc::new(ManualClock::new(now));
    let store = local_store();
    store
        .insert_points(&[MetricPoint::new(
            FEES_AVG_TX_FEE_MON,
            now - Duration::minutes(30),
            0.0003,
        )])
        .await
        .unwrap();
    let service = query_service(store, clock);

    let day = service.fees_series(Window::OneDay, Step::TwoHours).await.unwrap();
    let hour = service
        .fees_series(Window::OneHour, Step::ThirtyMinutes)
        .await
        .unwrap();

    assert_eq!(day.labels.len(), 13);
    assert_eq!(hour.labels.len(), 3);
    assert_eq!(service.cache().len(), 2);
}

#[tokio::test]
async fn test_composition_splits_dimensions() {
    let now = fixed_now();
    let clock = Arc::new(ManualClock::new(now));
    let store = local_store();
    let ts = now - Duration::minutes(20);
    store
        .insert_points(&[
            MetricPoint::new(TX_MIX_COUNT, ts, 40.0).with_dimension(DIM_TRANSFERS),
            MetricPoint::new(TX_MIX_COUNT, ts, 45.0).with_dimension(DIM_CONTRACT_CALLS),
            MetricPoint::new(ECONOMICS_BURN_SHARE, ts, 35.0),
        ])
        .await
        .unwrap();
    let service = query_service(store, clock.clone());

    let response = service
        .tx_composition_series(Window::OneHour, Step::ThirtyMinutes)
        .await
        .unwrap();

    let keys: Vec<&str> = response.series.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["transfers", "contract_calls", "system_misc"]);
    assert!(response.series.iter().all(|s| s.unit.as_deref() == Some("%")));
    // Buckets: [-60m,-30m) [-30m,0) [0,+30m)
    assert_eq!(response.series[0].values, vec![0.0, 40.0, 40.0]);
    assert_eq!(response.series[1].values, vec![0.0, 45.0, 45.0]);
    assert_eq!(response.series[2].values, vec![0.0, 0.0, 0.0]);

    // Composition results live for 10s
    clock.advance(Duration::seconds(8));
    service
        .tx_composition_series(Window::OneHour, Step::ThirtyMinutes)
        .await
        .unwrap();
    assert_eq!(service.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_series_json_shape() {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let service = query_service(local_store(), clock);

    let response = service
        .economics_series(Window::SixHours, Step::OneHour)
        .await
        .unwrap();
    let json = serde_json::to_value(response.as_ref()).unwrap();

    assert_eq!(json["window"], "6h");
    assert_eq!(json["step"], "1h");
    assert_eq!(json["labels"].as_array().unwrap().len(), 7);
    assert_eq!(json["series"][2]["key"], "compute_pressure");
    assert_eq!(json["series"][2]["unit"], "idx");
}

#[tokio::test]
async fn test_store_errors_propagate_and_are_not_cached() {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let service = query_service(Arc::new(FailingStore), clock);

    let err = service.snapshot().await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let err = service
        .fees_series(Window::OneDay, Step::TwoHours)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    assert!(service.cache().is_empty());
    assert!(service.ping_store().await.is_err());
}
