//! Wall-clock sources
//!
//! Every component that stamps, expires or prunes data reads time through
//! [`Clock`], so tests can pin and advance it deterministically.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current wall-clock instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Instant before which data falls outside a retention horizon of `days`.
    ///
    /// Records strictly older than the cutoff are eligible for deletion; a
    /// record stamped exactly at the cutoff is kept.
    fn retention_cutoff(&self, days: u32) -> DateTime<Utc> {
        self.now() - Duration::days(days as i64)
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Millisecond resolution, matching the precision stored timestamps are
/// compared at.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::AcqRel);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now_ms.store(to.timestamp_millis(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.now_ms.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(ms).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::milliseconds(150));
        assert_eq!(clock.now(), start + Duration::milliseconds(150));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_retention_cutoff_is_exact() {
        let start = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(
            clock.retention_cutoff(14),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_system_clock_is_recent() {
        // Should be a reasonable time (after 2020)
        assert!(SystemClock.now().timestamp() > 1_577_836_800);
    }
}
