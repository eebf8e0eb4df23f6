//! Sliding sample window behind the live graph.
//!
//! The window is driven by [`LiveWindow::tick`], called once per redraw
//! interval with the newest update drained from the channel. It keeps one
//! bounded FIFO per field and decides whether the frame may be drawn.

use std::collections::VecDeque;

use crate::sink::{LiveUpdate, LiveValue};

/// Upper bound on samples kept per field.
pub const MAX_LIVE_SAMPLES: usize = 100_000;

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Some field has fewer than two samples, or no current value.
    Waiting,
    /// Every field is ready; redraw.
    Draw,
    /// Data ingestion is suspended.
    Paused,
    /// The window must close; the timer stops.
    Close(CloseReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloseReason {
    Requested,
    /// A field delivered an array instead of a scalar.
    ArrayValue { field: String, len: usize },
}

pub struct LiveWindow {
    fields: Vec<String>,
    tick_resolution: f64,
    timespan: f64,
    x_data: Vec<f64>,
    data: Vec<VecDeque<f64>>,
    /// Newest value set from the channel; reused every tick until replaced.
    values: Vec<Option<LiveValue>>,
    paused: bool,
    clear_requested: bool,
    close_requested: bool,
    closed: bool,
}

impl LiveWindow {
    pub fn new(fields: Vec<String>, tick_resolution: f64, timespan: f64) -> Self {
        let x_data = x_axis(timespan, tick_resolution);
        let n = fields.len();
        Self {
            fields,
            tick_resolution,
            timespan,
            x_data,
            data: vec![VecDeque::new(); n],
            values: vec![None; n],
            paused: false,
            clear_requested: false,
            close_requested: false,
            closed: false,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn tick_resolution(&self) -> f64 {
        self.tick_resolution
    }

    pub fn timespan(&self) -> f64 {
        self.timespan
    }

    /// Samples kept per field.
    pub fn capacity(&self) -> usize {
        self.x_data.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn request_clear(&mut self) {
        self.clear_requested = true;
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Advance one redraw interval.
    pub fn tick(&mut self, update: Option<LiveUpdate>) -> TickOutcome {
        if self.closed {
            return TickOutcome::Close(CloseReason::Requested);
        }
        if self.close_requested {
            self.closed = true;
            return TickOutcome::Close(CloseReason::Requested);
        }
        if let Some(mut u) = update {
            u.resize(self.fields.len(), None);
            self.values = u;
        }
        if self.clear_requested {
            self.clear_requested = false;
            for d in &mut self.data {
                d.clear();
            }
        }
        if self.paused {
            return TickOutcome::Paused;
        }

        let cap = self.capacity();
        for (i, v) in self.values.iter().enumerate() {
            match v {
                Some(LiveValue::Array(a)) => {
                    log::error!(
                        "Cannot plot array of length {}. Use '{}[index]' instead",
                        a.len(),
                        self.fields[i]
                    );
                    self.closed = true;
                    return TickOutcome::Close(CloseReason::ArrayValue {
                        field: self.fields[i].clone(),
                        len: a.len(),
                    });
                }
                Some(LiveValue::Scalar(x)) => {
                    let d = &mut self.data[i];
                    d.push_back(*x);
                    while d.len() > cap {
                        d.pop_front();
                    }
                }
                None => {}
            }
        }

        let ready = self
            .values
            .iter()
            .zip(&self.data)
            .all(|(v, d)| v.is_some() && d.len() >= 2);
        if ready {
            TickOutcome::Draw
        } else {
            TickOutcome::Waiting
        }
    }

    /// Number of samples held per field.
    pub fn sample_counts(&self) -> Vec<usize> {
        self.data.iter().map(VecDeque::len).collect()
    }

    /// Points for field `i`, right-aligned so the newest sample sits at the
    /// last x position.
    pub fn series(&self, i: usize) -> Vec<[f64; 2]> {
        let Some(d) = self.data.get(i) else {
            return Vec::new();
        };
        let skip = self.x_data.len().saturating_sub(d.len());
        self.x_data[skip..]
            .iter()
            .zip(d.iter())
            .map(|(x, y)| [*x, *y])
            .collect()
    }

    /// X axis span shown by the window.
    pub fn x_bounds(&self) -> (f64, f64) {
        (self.x_data.first().copied().unwrap_or(-self.timespan), 0.0)
    }

    /// Y range over every held sample with 5% padding. A flat signal is
    /// widened by 10% of its value, or by 0.5 when that is still flat.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut it = self.data.iter().flatten().copied();
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let pad = 0.05 * (hi - lo);
        let (mut ymin, mut ymax) = (lo - pad, hi + pad);
        if ymin == ymax {
            ymax = ymin + 0.1 * ymin;
            ymin -= 0.1 * ymin;
        }
        if ymin == ymax {
            ymin -= 0.5;
            ymax = ymin + 1.0;
        }
        Some((ymin.min(ymax), ymin.max(ymax)))
    }
}

/// `[-timespan, 0)` in steps of `tick`.
fn x_axis(timespan: f64, tick: f64) -> Vec<f64> {
    if !(tick > 0.0) || !(timespan > 0.0) {
        return vec![0.0];
    }
    let n = (((timespan / tick) - 1e-9).ceil().max(1.0) as usize).min(MAX_LIVE_SAMPLES);
    (0..n).map(|k| -timespan + k as f64 * tick).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_axis_excludes_zero() {
        let x = x_axis(1.0, 0.25);
        assert_eq!(x, vec![-1.0, -0.75, -0.5, -0.25]);
    }

    #[test]
    fn x_axis_is_bounded() {
        assert_eq!(x_axis(1.0, 1e-300).len(), MAX_LIVE_SAMPLES);
        assert_eq!(x_axis(f64::INFINITY, 0.1).len(), MAX_LIVE_SAMPLES);
    }

    #[test]
    fn flat_signal_widens() {
        let mut w = LiveWindow::new(vec!["A".into()], 0.1, 1.0);
        w.tick(Some(vec![Some(LiveValue::Scalar(10.0))]));
        w.tick(None);
        assert_eq!(w.y_bounds(), Some((9.0, 11.0)));

        let mut z = LiveWindow::new(vec!["A".into()], 0.1, 1.0);
        z.tick(Some(vec![Some(LiveValue::Scalar(0.0))]));
        assert_eq!(z.y_bounds(), Some((-0.5, 0.5)));
    }

    #[test]
    fn fifo_is_bounded() {
        let mut w = LiveWindow::new(vec!["A".into()], 0.5, 2.0);
        for i in 0..10 {
            w.tick(Some(vec![Some(LiveValue::Scalar(i as f64))]));
        }
        assert_eq!(w.capacity(), 4);
        let ys: Vec<f64> = w.series(0).iter().map(|p| p[1]).collect();
        assert_eq!(ys, vec![6.0, 7.0, 8.0, 9.0]);
    }
}
