//! Wall-clock capability (DESIGN NOTES: "abstract behind a clock capability
//! so tests can inject deterministic time").
//!
//! The dispatcher and producer API never call `SystemTime::now()` directly;
//! they go through a `&dyn Clock` so that scenario tests (S1, S5) can pin
//! time to an exact value instead of racing the wall clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time, expressed as microseconds since the Unix epoch.
///
/// Microsecond resolution matches what the teacher's `esp_timer_get_time()`
/// provided and is enough precision for a syslog-style `HH:MM:SS` rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Decompose into `(year, month, day, hour, minute, second)`, UTC.
    ///
    /// A small hand-rolled civil-calendar conversion (Howard Hinnant's
    /// days_from_civil algorithm) is used instead of pulling in a datetime
    /// crate, since the formatter only ever needs these six fields.
    pub fn to_utc_parts(self) -> (i32, u32, u32, u32, u32, u32) {
        let secs_total = self.0.div_euclid(1_000_000);
        let days = secs_total.div_euclid(86_400);
        let secs_of_day = secs_total.rem_euclid(86_400);

        let (year, month, day) = civil_from_days(days);
        let hour = (secs_of_day / 3600) as u32;
        let minute = ((secs_of_day % 3600) / 60) as u32;
        let second = (secs_of_day % 60) as u32;
        (year, month, day, hour, minute, second)
    }
}

/// Inverse of `days_from_civil`; see http://howardhinnant.github.io/date_algorithms.html
fn civil_from_days(z: i64) -> (i32, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

/// Wall-clock capability.
pub trait Clock: Send + Sync {
    /// Capture the current time.
    fn now(&self) -> Timestamp;
}

/// Real wall clock, backed by `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp(dur.as_micros() as i64)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Deterministic clock for tests: starts at a fixed instant and only
    /// advances when told to.
    pub struct FakeClock(AtomicI64);

    impl FakeClock {
        pub fn new(start_us: i64) -> Self {
            Self(AtomicI64::new(start_us))
        }

        pub fn advance(&self, delta_us: i64) {
            self.0.fetch_add(delta_us, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Timestamp {
            Timestamp(self.0.load(Ordering::SeqCst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_utc_parts_matches_known_instant() {
        // 2024-01-02T03:04:05Z
        let ts = Timestamp(1_704_164_645_000_000);
        assert_eq!(ts.to_utc_parts(), (2024, 1, 2, 3, 4, 5));
    }

    #[test]
    fn to_utc_parts_epoch() {
        assert_eq!(Timestamp(0).to_utc_parts(), (1970, 1, 1, 0, 0, 0));
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        let b = clock.now();
        assert!(b.0 > a.0);
    }
}
