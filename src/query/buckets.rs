//! Bucket construction for windowed series

use chrono::{DateTime, Duration, Local, Utc};

/// Half-open interval `[start, end)` that points are averaged over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Bucket {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Display label: the bucket start in local time as `HH:MM`.
    pub fn label(&self) -> String {
        self.start.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Ordered buckets with one label per bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketSet {
    pub buckets: Vec<Bucket>,
    pub labels: Vec<String>,
}

impl BucketSet {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Split `[now - window, now]` into contiguous buckets of width `step`.
///
/// Buckets keep being emitted while their start is `<= now`, so when `window`
/// is a multiple of `step` the set ends with an extra bucket starting exactly
/// at `now`. The final bucket may reach past `now`.
///
/// Returns an empty set when `step` is not positive.
pub fn build_buckets(now: DateTime<Utc>, window: Duration, step: Duration) -> BucketSet {
    if step <= Duration::zero() {
        return BucketSet::default();
    }

    let end = now;
    let mut t = now - window;
    let mut set = BucketSet::default();

    while t <= end {
        let bucket = Bucket {
            start: t,
            end: t + step,
        };
        set.labels.push(bucket.label());
        set.buckets.push(bucket);
        t = bucket.end;
    }

    set
}
