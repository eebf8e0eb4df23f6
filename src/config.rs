//! Configuration types for the batch graph and the live graph.

use std::path::PathBuf;
use std::str::FromStr;

use egui::{Align2, Color32};
use egui_plot::{LineStyle, MarkerShape};

use crate::controllers::{LiveController, XRangeLink};
use crate::data::flightmode::FlightModeColours;
use crate::data::live::MAX_LIVE_SAMPLES;
use crate::error::GraphError;

// ─────────────────────────────────────────────────────────────────────────────
// Legend placement
// ─────────────────────────────────────────────────────────────────────────────

/// Legend location, named the way plotting tools usually spell them
/// (`"upper left"`, `"lower right"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegendPosition {
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    Right,
    CenterLeft,
    CenterRight,
    LowerCenter,
    UpperCenter,
    Center,
}

impl FromStr for LegendPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Ok(match norm.as_str() {
            "best" => LegendPosition::Best,
            "upper right" => LegendPosition::UpperRight,
            "upper left" => LegendPosition::UpperLeft,
            "lower left" => LegendPosition::LowerLeft,
            "lower right" => LegendPosition::LowerRight,
            "right" => LegendPosition::Right,
            "center left" => LegendPosition::CenterLeft,
            "center right" => LegendPosition::CenterRight,
            "lower center" => LegendPosition::LowerCenter,
            "upper center" => LegendPosition::UpperCenter,
            "center" => LegendPosition::Center,
            _ => return Err(format!("unknown legend position '{s}'")),
        })
    }
}

impl LegendPosition {
    /// Anchor of the legend box inside the plot area.
    pub fn align(&self) -> Align2 {
        match self {
            LegendPosition::Best | LegendPosition::UpperLeft => Align2::LEFT_TOP,
            LegendPosition::UpperRight => Align2::RIGHT_TOP,
            LegendPosition::LowerLeft => Align2::LEFT_BOTTOM,
            LegendPosition::LowerRight => Align2::RIGHT_BOTTOM,
            LegendPosition::Right | LegendPosition::CenterRight => Align2::RIGHT_CENTER,
            LegendPosition::CenterLeft => Align2::LEFT_CENTER,
            LegendPosition::LowerCenter => Align2::CENTER_BOTTOM,
            LegendPosition::UpperCenter => Align2::CENTER_TOP,
            LegendPosition::Center => Align2::CENTER_CENTER,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Marker and line style
// ─────────────────────────────────────────────────────────────────────────────

/// Point marker, parsed from the usual one-character codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerStyle {
    None,
    Plus,
    Point,
    Circle,
    Cross,
    Square,
    Diamond,
    Triangle,
    Star,
}

impl FromStr for MarkerStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "None" | "none" => MarkerStyle::None,
            "+" => MarkerStyle::Plus,
            "." | "," => MarkerStyle::Point,
            "o" => MarkerStyle::Circle,
            "x" | "X" => MarkerStyle::Cross,
            "s" => MarkerStyle::Square,
            "D" | "d" => MarkerStyle::Diamond,
            "^" | "v" | "<" | ">" => MarkerStyle::Triangle,
            "*" => MarkerStyle::Star,
            other => return Err(format!("unknown marker '{other}'")),
        })
    }
}

impl MarkerStyle {
    pub fn shape(&self) -> Option<MarkerShape> {
        match self {
            MarkerStyle::None => None,
            MarkerStyle::Plus => Some(MarkerShape::Plus),
            MarkerStyle::Point | MarkerStyle::Circle => Some(MarkerShape::Circle),
            MarkerStyle::Cross => Some(MarkerShape::Cross),
            MarkerStyle::Square => Some(MarkerShape::Square),
            MarkerStyle::Diamond => Some(MarkerShape::Diamond),
            MarkerStyle::Triangle => Some(MarkerShape::Up),
            MarkerStyle::Star => Some(MarkerShape::Asterisk),
        }
    }
}

/// Connecting-line style; `None` draws markers only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyleSpec {
    None,
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl FromStr for LineStyleSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "None" | "none" => LineStyleSpec::None,
            "-" | "solid" => LineStyleSpec::Solid,
            "--" | "dashed" => LineStyleSpec::Dashed,
            ":" | "dotted" => LineStyleSpec::Dotted,
            "-." | "dashdot" => LineStyleSpec::DashDot,
            other => return Err(format!("unknown line style '{other}'")),
        })
    }
}

impl LineStyleSpec {
    pub fn line_style(&self) -> Option<LineStyle> {
        match self {
            LineStyleSpec::None => None,
            LineStyleSpec::Solid => Some(LineStyle::Solid),
            LineStyleSpec::Dashed => Some(LineStyle::Dashed { length: 6.0 }),
            LineStyleSpec::Dotted => Some(LineStyle::Dotted { spacing: 4.0 }),
            // egui_plot has no dash-dot
            LineStyleSpec::DashDot => Some(LineStyle::Dashed { length: 3.0 }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Flight-mode overlay
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlightModeDisplay {
    /// No background bands.
    Off,
    /// Bands plus a mode legend next to the field legends.
    #[default]
    WithLegend,
    /// Bands with the mode legend shown on its own.
    LegendOnly,
}

impl FlightModeDisplay {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => FlightModeDisplay::Off,
            2 => FlightModeDisplay::LegendOnly,
            _ => FlightModeDisplay::WithLegend,
        }
    }

    pub fn enabled(&self) -> bool {
        *self != FlightModeDisplay::Off
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for one batch graph.
pub struct GraphConfig {
    // ── Extraction ───────────────────────────────────────────────────────────
    /// Records must satisfy this expression to be graphed.
    pub condition: Option<String>,
    /// Expression for the x axis instead of time.
    pub xaxis: Option<String>,
    /// Seconds added to timestamps when establishing the time origin.
    pub timeshift: f64,
    /// Per-field sample cap in Hz; `0.0` disables it.
    pub max_message_rate: f64,

    // ── Appearance ───────────────────────────────────────────────────────────
    pub title: Option<String>,
    /// One label per field per source, in source-major order.
    pub labels: Option<Vec<String>>,
    pub legend: LegendPosition,
    pub legend2: LegendPosition,
    pub legend_flightmode: LegendPosition,
    /// Defaults to none for time graphs and `+` for a custom x axis.
    pub marker: Option<MarkerStyle>,
    /// Defaults to solid for time graphs and none for a custom x axis.
    pub linestyle: Option<LineStyleSpec>,
    /// Every source uses the same colours instead of consecutive ones.
    pub multi: bool,
    pub show_flightmode: FlightModeDisplay,
    pub grid: bool,
    /// Mode colours, shared with other graphs when cloned in.
    pub flightmode_colours: FlightModeColours,

    // ── Output / window ──────────────────────────────────────────────────────
    /// Write to this file (`.png`, `.svg`, `.html`) instead of opening a window.
    pub output: Option<PathBuf>,
    /// Exported image size in pixels.
    pub output_size: (u32, u32),
    /// Optional eframe native-window options.
    pub native_options: Option<eframe::NativeOptions>,
    /// Zoom link to another window.
    pub xrange_link: Option<XRangeLink>,
}

impl GraphConfig {
    /// Marker after applying the x-axis dependent default.
    pub fn effective_marker(&self) -> MarkerStyle {
        self.marker.unwrap_or(if self.xaxis.is_some() {
            MarkerStyle::Plus
        } else {
            MarkerStyle::None
        })
    }

    /// Line style after applying the x-axis dependent default.
    pub fn effective_linestyle(&self) -> LineStyleSpec {
        self.linestyle.unwrap_or(if self.xaxis.is_some() {
            LineStyleSpec::None
        } else {
            LineStyleSpec::Solid
        })
    }

    /// Default export file name: the title with every non-alphanumeric
    /// character replaced by `_`, or `graph.png`.
    pub fn default_filename(&self) -> String {
        match &self.title {
            Some(t) if !t.is_empty() => {
                let stem: String = t
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { '_' })
                    .collect();
                format!("{stem}.png")
            }
            _ => "graph.png".to_string(),
        }
    }
}

impl Clone for GraphConfig {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            xaxis: self.xaxis.clone(),
            timeshift: self.timeshift,
            max_message_rate: self.max_message_rate,
            title: self.title.clone(),
            labels: self.labels.clone(),
            legend: self.legend,
            legend2: self.legend2,
            legend_flightmode: self.legend_flightmode,
            marker: self.marker,
            linestyle: self.linestyle,
            multi: self.multi,
            show_flightmode: self.show_flightmode,
            grid: self.grid,
            flightmode_colours: self.flightmode_colours.clone(),
            output: self.output.clone(),
            output_size: self.output_size,
            native_options: self.native_options.clone(),
            // a link pairs exactly two windows
            xrange_link: None,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            condition: None,
            xaxis: None,
            timeshift: 0.0,
            max_message_rate: 0.0,
            title: None,
            labels: None,
            legend: LegendPosition::UpperLeft,
            legend2: LegendPosition::UpperRight,
            legend_flightmode: LegendPosition::LowerLeft,
            marker: None,
            linestyle: None,
            multi: false,
            show_flightmode: FlightModeDisplay::WithLegend,
            grid: false,
            flightmode_colours: FlightModeColours::default(),
            output: None,
            output_size: (1600, 1000),
            native_options: None,
            xrange_link: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LiveGraphConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Shortest accepted redraw interval, in seconds.
pub const MIN_TICK_RESOLUTION: f64 = 0.01;

/// Settings for a live graph window.
pub struct LiveGraphConfig {
    pub title: String,
    /// Field names, in the order values arrive on the channel.
    pub fields: Vec<String>,
    /// One colour per field; missing entries fall back to the trace palette.
    pub colours: Vec<Color32>,
    /// Optional legend text per field.
    pub labels: Vec<Option<String>>,
    /// Redraw interval in seconds.
    pub tick_resolution: f64,
    /// Width of the visible window in seconds.
    pub timespan: f64,
    pub native_options: Option<eframe::NativeOptions>,
    /// External close/pause/clear handle.
    pub controller: Option<LiveController>,
}

impl LiveGraphConfig {
    pub fn new<S: Into<String>>(fields: Vec<S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Reject tick/timespan combinations the window cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        let tick = self.tick_resolution;
        if !tick.is_finite() || tick < MIN_TICK_RESOLUTION {
            return Err(GraphError::InvalidConfig(format!(
                "tick resolution must be at least {MIN_TICK_RESOLUTION}s, got {tick}"
            )));
        }
        let span = self.timespan;
        if !span.is_finite() || span <= 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "timespan must be positive, got {span}"
            )));
        }
        if span / tick > MAX_LIVE_SAMPLES as f64 {
            return Err(GraphError::InvalidConfig(format!(
                "{span}s at {tick}s per sample exceeds {MAX_LIVE_SAMPLES} samples"
            )));
        }
        Ok(())
    }

    /// Legend text for field `i`: the custom label when present, else the field.
    pub fn label(&self, i: usize) -> &str {
        match self.labels.get(i) {
            Some(Some(l)) => l,
            _ => self.fields.get(i).map(String::as_str).unwrap_or(""),
        }
    }
}

impl Default for LiveGraphConfig {
    fn default() -> Self {
        Self {
            title: "Live graph".to_string(),
            fields: Vec::new(),
            colours: Vec::new(),
            labels: Vec::new(),
            tick_resolution: 0.2,
            timespan: 20.0,
            native_options: None,
            controller: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_names_parse() {
        assert_eq!("upper left".parse(), Ok(LegendPosition::UpperLeft));
        assert_eq!("Lower_Right".parse(), Ok(LegendPosition::LowerRight));
        assert!("nowhere".parse::<LegendPosition>().is_err());
    }

    #[test]
    fn style_defaults_follow_xaxis() {
        let mut cfg = GraphConfig::default();
        assert_eq!(cfg.effective_marker(), MarkerStyle::None);
        assert_eq!(cfg.effective_linestyle(), LineStyleSpec::Solid);
        cfg.xaxis = Some("GPS.Lat".into());
        assert_eq!(cfg.effective_marker(), MarkerStyle::Plus);
        assert_eq!(cfg.effective_linestyle(), LineStyleSpec::None);
    }

    #[test]
    fn live_config_rejects_bad_timing() {
        let mut cfg = LiveGraphConfig::new(vec!["A"]);
        assert!(cfg.validate().is_ok());
        cfg.tick_resolution = f64::INFINITY;
        assert!(cfg.validate().is_err());
        cfg.tick_resolution = 1e-12;
        assert!(cfg.validate().is_err());
        cfg.tick_resolution = 0.05;
        cfg.timespan = 1e9;
        assert!(cfg.validate().is_err());
        cfg.timespan = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn filename_from_title() {
        let mut cfg = GraphConfig::default();
        assert_eq!(cfg.default_filename(), "graph.png");
        cfg.title = Some("Roll vs Pitch".into());
        assert_eq!(cfg.default_filename(), "Roll_vs_Pitch.png");
    }
}
