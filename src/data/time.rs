//! Day-number time axis.
//!
//! Timestamps (seconds since the UNIX epoch) are plotted as fractional days
//! since 1970-01-01 UTC. The first valid timestamp pins an origin through a
//! calendar conversion; every later conversion is a linear offset from it.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time-origin context for one graphing run.
///
/// Owned by the graph builder and reset at the start of every run, so
/// independent sessions never share an origin.
#[derive(Debug, Clone, Default)]
pub struct DayClock {
    timeshift: f64,
    /// `(origin in days, timestamp the origin corresponds to)`.
    origin: Option<(f64, f64)>,
}

impl DayClock {
    pub fn new(timeshift: f64) -> Self {
        Self {
            timeshift,
            origin: None,
        }
    }

    pub fn timeshift(&self) -> f64 {
        self.timeshift
    }

    pub fn is_primed(&self) -> bool {
        self.origin.is_some()
    }

    /// Forget the origin; the next conversion establishes a new one.
    pub fn reset(&mut self) {
        self.origin = None;
    }

    /// Convert a log timestamp to a day number.
    ///
    /// A timestamp that cannot be represented as a calendar date while no
    /// origin exists yields `0.0` instead of failing the run.
    pub fn to_days(&mut self, timestamp: f64) -> f64 {
        let (base_days, base_time) = match self.origin {
            Some(o) => o,
            None => match datetime_from_secs(timestamp + self.timeshift) {
                Some(dt) => {
                    let o = (datetime_to_days(&dt), timestamp);
                    self.origin = Some(o);
                    o
                }
                None => return 0.0,
            },
        };
        base_days + (timestamp - base_time) / SECONDS_PER_DAY
    }
}

/// Calendar conversion: fractional days since the epoch for a UTC datetime.
pub fn datetime_to_days(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 / SECONDS_PER_DAY
        + dt.timestamp_subsec_nanos() as f64 / (SECONDS_PER_DAY * 1e9)
}

pub fn datetime_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole.abs() > i64::MAX as f64 {
        return None;
    }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Inverse of the day-number scale, used by tick and cursor formatting.
pub fn days_to_datetime(days: f64) -> Option<DateTime<Utc>> {
    datetime_from_secs(days * SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_lazy_and_linear() {
        let mut clock = DayClock::new(0.0);
        assert!(!clock.is_primed());
        let d0 = clock.to_days(86_400.0 * 2.0);
        assert!((d0 - 2.0).abs() < 1e-12);
        assert!(clock.is_primed());
        let d1 = clock.to_days(86_400.0 * 2.0 + 43_200.0);
        assert!((d1 - 2.5).abs() < 1e-12);
    }

    #[test]
    fn timeshift_moves_origin_only() {
        let mut clock = DayClock::new(3_600.0);
        let d0 = clock.to_days(0.0);
        assert!((d0 - 1.0 / 24.0).abs() < 1e-12);
        let d1 = clock.to_days(3_600.0);
        assert!((d1 - 2.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn corrupt_timestamp_yields_zero_without_priming() {
        let mut clock = DayClock::new(0.0);
        assert_eq!(clock.to_days(f64::NAN), 0.0);
        assert_eq!(clock.to_days(1e300), 0.0);
        assert!(!clock.is_primed());
    }
}
