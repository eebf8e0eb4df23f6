//! TraceLook: visual styling for graph traces.

use eframe::egui;
use egui_plot::{LineStyle, MarkerShape};

use crate::config::{LineStyleSpec, MarkerStyle};

/// Trace colours in allocation order: red, green, blue, orange, olive, black,
/// grey, yellow, brown, darkcyan, cornflowerblue, darkmagenta, deeppink, darkred.
pub const TRACE_PALETTE: [egui::Color32; 14] = [
    egui::Color32::from_rgb(255, 0, 0),
    egui::Color32::from_rgb(0, 128, 0),
    egui::Color32::from_rgb(0, 0, 255),
    egui::Color32::from_rgb(255, 165, 0),
    egui::Color32::from_rgb(128, 128, 0),
    egui::Color32::from_rgb(0, 0, 0),
    egui::Color32::from_rgb(128, 128, 128),
    egui::Color32::from_rgb(255, 255, 0),
    egui::Color32::from_rgb(165, 42, 42),
    egui::Color32::from_rgb(0, 139, 139),
    egui::Color32::from_rgb(100, 149, 237),
    egui::Color32::from_rgb(139, 0, 139),
    egui::Color32::from_rgb(255, 20, 147),
    egui::Color32::from_rgb(139, 0, 0),
];

/// The visual presentation of a trace (color, line style, markers).
#[derive(Debug, Clone)]
pub struct TraceLook {
    pub color: egui::Color32,
    pub width: f32,
    /// `None` hides the connecting line.
    pub style: Option<LineStyle>,
    pub point_size: f32,
    /// `None` hides the markers.
    pub marker: Option<MarkerShape>,
}

impl Default for TraceLook {
    fn default() -> Self {
        Self {
            color: TRACE_PALETTE[0],
            width: 1.5,
            style: Some(LineStyle::Solid),
            point_size: 4.0,
            marker: None,
        }
    }
}

impl TraceLook {
    /// Look for the trace at palette slot `index`.
    pub fn new(index: usize, marker: MarkerStyle, line: LineStyleSpec) -> Self {
        Self {
            color: Self::alloc_color(index),
            style: line.line_style(),
            marker: marker.shape(),
            ..Default::default()
        }
    }

    /// Palette colour for `index`; slots past the end of the palette are red.
    pub fn alloc_color(index: usize) -> egui::Color32 {
        TRACE_PALETTE.get(index).copied().unwrap_or(TRACE_PALETTE[0])
    }

    pub fn show_line(&self) -> bool {
        self.style.is_some()
    }

    pub fn show_points(&self) -> bool {
        self.marker.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_overflow_is_red() {
        assert_eq!(TraceLook::alloc_color(2), egui::Color32::from_rgb(0, 0, 255));
        assert_eq!(TraceLook::alloc_color(14), TRACE_PALETTE[0]);
        assert_eq!(TraceLook::alloc_color(100), TRACE_PALETTE[0]);
    }
}
