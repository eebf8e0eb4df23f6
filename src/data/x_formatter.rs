//! X-axis value formatters for day-number time axes and plain numeric axes.
//!
//! Time values are fractional days since 1970-01-01 (see [`crate::data::time`]).
//! [`XFormatter`] renders tick labels and cursor readouts; [`time_grid_marks`]
//! places ticks on round wall-clock steps instead of decimal fractions of a day.

use chrono::Datelike;

use crate::data::time::{days_to_datetime, SECONDS_PER_DAY};

// ─────────────────────────────────────────────────────────────────────────────
// TimeResolution
// ─────────────────────────────────────────────────────────────────────────────

/// Granularity of the sub-second portion shown in a time label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeResolution {
    /// `HH:MM:SS`.
    Seconds,
    /// `HH:MM:SS.mmm`.
    Milliseconds,
}

// ─────────────────────────────────────────────────────────────────────────────
// TimeFormatter
// ─────────────────────────────────────────────────────────────────────────────

/// Timestamp formatter for day-number axes, always in UTC.
///
/// The date is only shown when the visible range crosses a calendar day (or
/// [`force_date_visible`](Self::force_date_visible) is set); the year only
/// when it crosses a year. Milliseconds appear once the visible range drops
/// below [`milliseconds_threshold`](Self::milliseconds_threshold) seconds.
#[derive(Debug, Clone)]
pub struct TimeFormatter {
    pub force_date_visible: bool,
    /// Visible span in seconds below which milliseconds are shown.
    pub milliseconds_threshold: f64,
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self {
            force_date_visible: false,
            milliseconds_threshold: 600.0,
        }
    }
}

impl TimeFormatter {
    /// Format day number `value` given the visible range (also in days).
    pub fn format(&self, value: f64, range: (f64, f64)) -> String {
        let (lo, hi) = if range.0 <= range.1 {
            range
        } else {
            (range.1, range.0)
        };
        let Some(value_dt) = days_to_datetime(value) else {
            return format!("{value:.6}");
        };
        let (start, end) = (days_to_datetime(lo), days_to_datetime(hi));
        let (date_changes, year_changes) = match (start, end) {
            (Some(s), Some(e)) => (s.date_naive() != e.date_naive(), s.year() != e.year()),
            _ => (false, false),
        };
        let show_date = date_changes || self.force_date_visible;

        let base = if show_date && year_changes {
            value_dt.format("%Y-%m-%d %H:%M:%S").to_string()
        } else if show_date {
            value_dt.format("%m-%d %H:%M:%S").to_string()
        } else {
            value_dt.format("%H:%M:%S").to_string()
        };

        match self.determine_resolution((hi - lo) * SECONDS_PER_DAY) {
            TimeResolution::Seconds => base,
            TimeResolution::Milliseconds => {
                format!("{}.{:03}", base, value_dt.timestamp_subsec_millis())
            }
        }
    }

    pub fn determine_resolution(&self, span_secs: f64) -> TimeResolution {
        if span_secs < self.milliseconds_threshold {
            TimeResolution::Milliseconds
        } else {
            TimeResolution::Seconds
        }
    }

    /// Full-precision label used by the cursor readout.
    pub fn format_full(&self, value: f64) -> String {
        match days_to_datetime(value) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            None => format!("{value:.6}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// XFormatter
// ─────────────────────────────────────────────────────────────────────────────

/// How x values are rendered.
#[derive(Debug, Clone)]
pub enum XFormatter {
    /// Day-number time axis.
    Time(TimeFormatter),
    /// Custom x-axis expression; plain numbers.
    Numeric,
}

impl Default for XFormatter {
    fn default() -> Self {
        XFormatter::Time(TimeFormatter::default())
    }
}

impl XFormatter {
    pub fn is_time(&self) -> bool {
        matches!(self, XFormatter::Time(_))
    }

    /// Tick label for `value` with the visible range and tick step.
    pub fn format_tick(&self, value: f64, range: (f64, f64), step: f64) -> String {
        match self {
            XFormatter::Time(tf) => tf.format(value, range),
            XFormatter::Numeric => format_adaptive_numeric(value, 3, step),
        }
    }

    /// Cursor readout: full timestamp, or `%.3f` for numeric axes.
    pub fn format_cursor(&self, value: f64) -> String {
        match self {
            XFormatter::Time(tf) => tf.format_full(value),
            XFormatter::Numeric => format!("{value:.3}"),
        }
    }
}

/// Plain decimals, switching to scientific notation when the tick step is far
/// from unity.
pub fn format_adaptive_numeric(v: f64, dec_pl: usize, step: f64) -> String {
    let sci = if step.is_finite() && step != 0.0 {
        let exp = step.abs().log10().floor() as i32;
        exp < -(dec_pl as i32) || exp >= 6
    } else {
        false
    };
    if sci {
        format_scientific(v, dec_pl)
    } else {
        let s = format!("{:.*}", dec_pl, v);
        // trim trailing zeros but keep at least one digit
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        }
    }
}

/// Render `value` as compact scientific notation like `1.23e5` or `-4.00e-2`.
fn format_scientific(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return format!("{:.*}", digits, 0.0_f64);
    }
    if !value.is_finite() {
        return format!("{}", value);
    }
    let exp = value.abs().log10().floor() as i32;
    let mantissa = value / 10f64.powi(exp);
    if exp == 0 {
        format!("{:.*}", digits, mantissa)
    } else {
        format!("{:.*}e{}", digits, mantissa, exp)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Time grid
// ─────────────────────────────────────────────────────────────────────────────

/// Round wall-clock tick steps, in seconds.
const TIME_STEPS_SECS: [f64; 27] = [
    0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0,
    120.0, 300.0, 600.0, 900.0, 1800.0, 3600.0, 7200.0, 10800.0, 21600.0, 43200.0, 86400.0,
];

/// Smallest round step (in days) not below `min_step_days`.
pub fn time_step_at_least(min_step_days: f64) -> f64 {
    let secs = min_step_days * SECONDS_PER_DAY;
    for s in TIME_STEPS_SECS {
        if s >= secs {
            return s / SECONDS_PER_DAY;
        }
    }
    // beyond a day: whole days, 1/2/5 x 10^n
    let days = min_step_days.max(1.0);
    let mag = 10f64.powf(days.log10().floor());
    for m in [1.0, 2.0, 5.0, 10.0] {
        if m * mag >= days {
            return m * mag;
        }
    }
    10.0 * mag
}

/// Grid marks `(value, step)` on three levels of round time steps covering
/// `bounds` (in days). `base_step` is the finest step that still leaves room
/// between lines.
pub fn time_grid_marks(bounds: (f64, f64), base_step: f64) -> Vec<(f64, f64)> {
    let (lo, hi) = bounds;
    if !(base_step > 0.0) || !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Vec::new();
    }
    let fine = time_step_at_least(base_step);
    let mid = time_step_at_least(fine * 4.0);
    let coarse = time_step_at_least(mid * 4.0);
    let mut out = Vec::new();
    for step in [fine, mid, coarse] {
        if (hi - lo) / step > 1000.0 {
            continue;
        }
        let mut k = (lo / step).ceil();
        while k * step <= hi {
            out.push((k * step, step));
            k += 1.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_rounds_up_to_wall_clock() {
        let s = time_step_at_least(7.0 / SECONDS_PER_DAY);
        assert!((s * SECONDS_PER_DAY - 10.0).abs() < 1e-9);
        let h = time_step_at_least(2000.0 / SECONDS_PER_DAY);
        assert!((h * SECONDS_PER_DAY - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn numeric_trims_zeros() {
        assert_eq!(format_adaptive_numeric(1.5, 3, 0.5), "1.5");
        assert_eq!(format_adaptive_numeric(2.0, 3, 1.0), "2");
    }
}
