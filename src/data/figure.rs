//! Renderer-independent figure model.
//!
//! A [`Figure`] is what both the interactive window and the file exporter
//! draw: styled traces per source, merged text annotations, the flight-mode
//! overlay, legend bookkeeping and the mapping that puts secondary-axis
//! traces into the primary coordinate system.

use egui::Color32;

use crate::config::{FlightModeDisplay, GraphConfig, LegendPosition};
use crate::data::field::{Axis, FieldSpec};
use crate::data::flightmode::{FlightModeInterval, ModeBand, ModeOverlay};
use crate::data::graph::{Sample, SourceSeries};
use crate::data::time::DayClock;
use crate::data::trace_look::TraceLook;
use crate::data::x_formatter::{TimeFormatter, XFormatter};
use crate::error::{GraphError, Result};

/// One plotted numeric series.
#[derive(Debug, Clone)]
pub struct Trace {
    pub label: String,
    pub axis: Axis,
    pub look: TraceLook,
    /// Points in the trace's own axis units.
    pub points: Vec<[f64; 2]>,
    pub source: usize,
    pub field: usize,
}

/// A vertical text annotation from a text-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMark {
    pub x: f64,
    pub text: String,
    pub color: Color32,
    pub axis: Axis,
}

/// One legend row: a line sample for traces, a filled patch for flight modes.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color32,
    pub patch: bool,
}

/// Affine map from secondary-axis values into primary plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    pub scale: f64,
    pub offset: f64,
}

impl Default for AxisMap {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl AxisMap {
    /// Map that sends `from` onto `to`.
    pub fn fit(from: (f64, f64), to: (f64, f64)) -> Self {
        let span = from.1 - from.0;
        if !(span.abs() > 0.0) || !span.is_finite() {
            return Self {
                scale: 1.0,
                offset: to.0 - from.0,
            };
        }
        let scale = (to.1 - to.0) / span;
        Self {
            scale,
            offset: to.0 - from.0 * scale,
        }
    }

    pub fn to_primary(&self, y: f64) -> f64 {
        y * self.scale + self.offset
    }

    pub fn from_primary(&self, p: f64) -> f64 {
        (p - self.offset) / self.scale
    }
}

pub struct Figure {
    /// Window title: the configured title, else the first label.
    pub window_title: String,
    /// Heading drawn above the plot.
    pub heading: Option<String>,
    pub traces: Vec<Trace>,
    pub texts: Vec<TextMark>,
    pub x_formatter: XFormatter,
    /// Full data extent along x.
    pub x_range: (f64, f64),
    pub axis_map: AxisMap,
    pub legend: LegendPosition,
    pub legend2: LegendPosition,
    pub legend_flightmode: LegendPosition,
    pub show_flightmode: FlightModeDisplay,
    pub grid: bool,
    pub flightmodes: Vec<FlightModeInterval>,
    pub overlay: ModeOverlay,
    pub clock: DayClock,
    pub default_filename: String,
}

impl Figure {
    /// Build a figure from extracted series.
    ///
    /// Fails with [`GraphError::LabelCount`] when explicit labels do not cover
    /// every field of every source, and with [`GraphError::NoData`] when no
    /// field produced a sample.
    pub fn build(
        cfg: &GraphConfig,
        fields: &[FieldSpec],
        sources: &[SourceSeries],
        flightmodes: Vec<FlightModeInterval>,
        clock: DayClock,
    ) -> Result<Figure> {
        let n = fields.len();
        if let Some(labels) = &cfg.labels {
            if labels.len() != n * sources.len() {
                return Err(GraphError::LabelCount {
                    labels: labels.len(),
                    expected: n * sources.len(),
                });
            }
        }
        let marker = cfg.effective_marker();
        let line = cfg.effective_linestyle();

        let mut traces = Vec::new();
        let mut texts = Vec::new();
        for (fi, src) in sources.iter().enumerate() {
            let colour_offset = if cfg.multi { 0 } else { fi * n };
            for (i, f) in fields.iter().enumerate() {
                let Some(samples) = src.series.get(i) else {
                    continue;
                };
                if samples.is_empty() {
                    continue;
                }
                let label = trace_label(f, cfg.labels.as_deref(), fi * n + i);
                let look = TraceLook::new(colour_offset + i, marker, line);
                if samples[0].y.is_text() && cfg.xaxis.is_none() {
                    texts.extend(merge_texts(samples, look.color, f.axis));
                    continue;
                }
                let points: Vec<[f64; 2]> = samples
                    .iter()
                    .filter_map(|s| s.y.as_f64().map(|y| [s.x, y]))
                    .collect();
                if points.is_empty() {
                    continue;
                }
                traces.push(Trace {
                    label,
                    axis: f.axis,
                    look,
                    points,
                    source: fi,
                    field: i,
                });
            }
        }

        let x_range = traces
            .iter()
            .flat_map(|t| t.points.iter().map(|p| p[0]))
            .chain(texts.iter().map(|t| t.x))
            .fold(None, |acc: Option<(f64, f64)>, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
            .ok_or(GraphError::NoData)?;

        let window_title = cfg
            .title
            .clone()
            .or_else(|| traces.first().map(|t| t.label.clone()))
            .unwrap_or_else(|| "Graph".to_string());

        let mut fig = Figure {
            window_title,
            heading: cfg.title.clone(),
            traces,
            texts,
            x_formatter: if cfg.xaxis.is_some() {
                XFormatter::Numeric
            } else {
                XFormatter::Time(TimeFormatter::default())
            },
            x_range,
            axis_map: AxisMap::default(),
            legend: cfg.legend,
            legend2: cfg.legend2,
            legend_flightmode: cfg.legend_flightmode,
            show_flightmode: if cfg.xaxis.is_some() {
                FlightModeDisplay::Off
            } else {
                cfg.show_flightmode
            },
            grid: cfg.grid,
            flightmodes,
            overlay: ModeOverlay::new(cfg.flightmode_colours.clone()),
            clock,
            default_filename: cfg.default_filename(),
        };
        fig.rescale(x_range);
        Ok(fig)
    }

    pub fn has_secondary(&self) -> bool {
        self.traces.iter().any(|t| t.axis == Axis::Secondary)
    }

    pub fn labels(&self, axis: Axis) -> Vec<&str> {
        self.traces
            .iter()
            .filter(|t| t.axis == axis)
            .map(|t| t.label.as_str())
            .collect()
    }

    /// Legend boxes to draw and where.
    ///
    /// Field legends go to `legend`/`legend2`; the flight-mode legend lists the
    /// modes drawn so far at `legend_flightmode`. When the mode legend is shown
    /// on its own the field legends are left out.
    pub fn legends(&self) -> Vec<(LegendPosition, Vec<LegendEntry>)> {
        let mut out = Vec::new();
        if self.show_flightmode != FlightModeDisplay::LegendOnly {
            for (axis, pos) in [(Axis::Primary, self.legend), (Axis::Secondary, self.legend2)] {
                let entries: Vec<LegendEntry> = self
                    .traces
                    .iter()
                    .filter(|t| t.axis == axis)
                    .map(|t| LegendEntry {
                        label: t.label.clone(),
                        color: t.look.color,
                        patch: false,
                    })
                    .collect();
                if !entries.is_empty() {
                    out.push((pos, entries));
                }
            }
        }
        if self.show_flightmode.enabled() && !self.overlay.legend().is_empty() {
            let entries = self
                .overlay
                .legend()
                .iter()
                .map(|(mode, c)| LegendEntry {
                    label: mode.clone(),
                    color: ModeOverlay::legend_colour(*c),
                    patch: true,
                })
                .collect();
            out.push((self.legend_flightmode, entries));
        }
        out
    }

    /// Points of `trace` in primary plot coordinates.
    pub fn plot_points(&self, trace: &Trace) -> Vec<[f64; 2]> {
        match trace.axis {
            Axis::Primary => trace.points.clone(),
            Axis::Secondary => trace
                .points
                .iter()
                .map(|p| [p[0], self.axis_map.to_primary(p[1])])
                .collect(),
        }
    }

    /// Fit y to the data inside `xlim`, one axis at a time, and return the
    /// primary y bounds. The secondary axis is refit onto those bounds.
    pub fn rescale(&mut self, xlim: (f64, f64)) -> (f64, f64) {
        let primary = fit_y(self.axis_points(Axis::Primary), xlim);
        let secondary = fit_y(self.axis_points(Axis::Secondary), xlim);
        match (primary, secondary) {
            (Some(p), Some(s)) => {
                self.axis_map = AxisMap::fit(s, p);
                p
            }
            (Some(p), None) => p,
            (None, Some(s)) => {
                self.axis_map = AxisMap::default();
                s
            }
            (None, None) => (-1.0, 1.0),
        }
    }

    fn axis_points(&self, axis: Axis) -> impl Iterator<Item = &[f64; 2]> + '_ {
        self.traces
            .iter()
            .filter(move |t| t.axis == axis)
            .flat_map(|t| t.points.iter())
    }

    /// Flight-mode bands clipped to `xlim`; empty when the overlay is off.
    pub fn mode_bands(&mut self, xlim: (f64, f64)) -> Vec<ModeBand> {
        if !self.show_flightmode.enabled() {
            return Vec::new();
        }
        self.overlay.bands(&self.flightmodes, &mut self.clock, xlim)
    }

    /// `x=<x> Left=<y1> Right=<y2>` for a pointer at primary coordinates `(x, y)`.
    pub fn cursor_text(&self, x: f64, y: f64) -> String {
        let xs = self.x_formatter.format_cursor(x);
        if self.has_secondary() {
            format!(
                "x={} Left={:.3} Right={:.3}",
                xs,
                y,
                self.axis_map.from_primary(y)
            )
        } else {
            format!("x={xs} y={y:.3}")
        }
    }
}

/// Legend text for a field: inline `<label>` wins, then the explicit label
/// list, then the expression. Secondary labels never keep a trailing `:2`.
fn trace_label(f: &FieldSpec, labels: Option<&[String]>, idx: usize) -> String {
    if let Some(l) = &f.label {
        return l.clone();
    }
    let base = labels
        .and_then(|l| l.get(idx))
        .cloned()
        .unwrap_or_else(|| f.expression.clone());
    match base.strip_suffix(":2") {
        Some(s) if f.axis == Axis::Secondary => s.to_string(),
        _ => base,
    }
}

/// Collapse text samples sharing an x (to 1e-6) into `[a][b]` marks.
pub fn merge_texts(samples: &[Sample], color: Color32, axis: Axis) -> Vec<TextMark> {
    let mut out: Vec<TextMark> = Vec::new();
    let mut last_x = None;
    for s in samples {
        let x = (s.x * 1e6).round() / 1e6;
        let piece = format!("[{}]", s.y);
        match out.last_mut() {
            Some(m) if last_x == Some(x) => m.text.push_str(&piece),
            _ => out.push(TextMark {
                x,
                text: piece,
                color,
                axis,
            }),
        }
        last_x = Some(x);
    }
    out
}

/// Y range of `points` with x inside `xlim`, padded by 5%.
pub fn fit_y<'a>(points: impl Iterator<Item = &'a [f64; 2]>, xlim: (f64, f64)) -> Option<(f64, f64)> {
    let (lo, hi) = points
        .filter(|p| p[0] >= xlim.0 && p[0] <= xlim.1 && p[1].is_finite())
        .fold(None, |acc: Option<(f64, f64)>, p| match acc {
            None => Some((p[1], p[1])),
            Some((lo, hi)) => Some((lo.min(p[1]), hi.max(p[1]))),
        })?;
    let mut pad = 0.05 * (hi - lo);
    if pad == 0.0 {
        pad = (0.001 * lo).abs();
    }
    if pad == 0.0 {
        pad = 0.5;
    }
    Some((lo - pad, hi + pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Value;

    fn text(x: f64, t: &str) -> Sample {
        Sample {
            x,
            y: Value::from(t),
        }
    }

    #[test]
    fn texts_at_same_time_merge() {
        let marks = merge_texts(
            &[text(1.0, "a"), text(1.0000000001, "b"), text(2.0, "c")],
            Color32::RED,
            Axis::Primary,
        );
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].text, "[a][b]");
        assert_eq!(marks[1].text, "[c]");
    }

    #[test]
    fn flat_fit_pads_by_fraction_of_value() {
        let pts = [[0.0, 100.0], [1.0, 100.0]];
        let (lo, hi) = fit_y(pts.iter(), (0.0, 1.0)).unwrap();
        assert!((lo - 99.9).abs() < 1e-9 && (hi - 100.1).abs() < 1e-9);
    }

    #[test]
    fn axis_map_round_trips() {
        let m = AxisMap::fit((0.0, 10.0), (100.0, 200.0));
        assert_eq!(m.to_primary(5.0), 150.0);
        assert!((m.from_primary(150.0) - 5.0).abs() < 1e-12);
    }
}
