//! Flight-mode intervals and their background overlay.
//!
//! Intervals are `(mode, start, end)` in log seconds, ordered by start. Every
//! mode name gets a stable colour the first time it is seen; the overlay clips
//! intervals to the visible x range and remembers which modes it drew so the
//! mode legend only lists what is on screen.

use std::collections::{HashMap, HashSet};

use egui::Color32;

use crate::data::record::{RecordSource, Value};
use crate::data::time::DayClock;
use crate::error::Result;

/// Band fill opacity. Legend patches use 1.5x this.
pub const BAND_ALPHA: f32 = 0.3;

pub const BAND_EDGE: Color32 = Color32::from_rgb(26, 26, 26);

/// Background colours, handed out in first-seen order.
pub const FLIGHTMODE_PALETTE: [Color32; 15] = [
    Color32::from_rgb(255, 0, 0),
    Color32::from_rgb(0, 255, 0),
    Color32::from_rgb(0, 0, 255),
    Color32::from_rgb(0, 255, 255),
    Color32::from_rgb(255, 0, 255),
    Color32::from_rgb(255, 255, 0),
    Color32::from_rgb(255, 128, 0),
    Color32::from_rgb(255, 0, 128),
    Color32::from_rgb(128, 255, 0),
    Color32::from_rgb(0, 255, 128),
    Color32::from_rgb(128, 0, 255),
    Color32::from_rgb(0, 128, 255),
    Color32::from_rgb(255, 128, 128),
    Color32::from_rgb(128, 255, 128),
    Color32::from_rgb(128, 128, 255),
];

#[derive(Debug, Clone, PartialEq)]
pub struct FlightModeInterval {
    pub mode: String,
    /// Start time in log seconds.
    pub start: f64,
    /// End time in log seconds.
    pub end: f64,
}

impl FlightModeInterval {
    pub fn new<S: Into<String>>(mode: S, start: f64, end: f64) -> Self {
        Self {
            mode: mode.into(),
            start,
            end,
        }
    }
}

/// Mode name to colour assignment.
///
/// Can be shared between graphs (clone it in, read it back) so the same mode
/// keeps its colour across windows.
#[derive(Debug, Clone, Default)]
pub struct FlightModeColours {
    map: HashMap<String, Color32>,
    next: usize,
}

impl FlightModeColours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colour(&mut self, mode: &str) -> Color32 {
        if let Some(c) = self.map.get(mode) {
            return *c;
        }
        if self.next >= FLIGHTMODE_PALETTE.len() {
            log::warn!("Out of colours; reusing");
            self.next = 0;
        }
        let c = FLIGHTMODE_PALETTE[self.next];
        self.next += 1;
        self.map.insert(mode.to_string(), c);
        c
    }

    pub fn get(&self, mode: &str) -> Option<Color32> {
        self.map.get(mode).copied()
    }
}

/// One clipped background band in day-number coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeBand {
    pub mode: String,
    pub x0: f64,
    pub x1: f64,
    pub colour: Color32,
}

/// Background band builder plus the record of modes it has drawn.
#[derive(Debug, Clone, Default)]
pub struct ModeOverlay {
    pub colours: FlightModeColours,
    plotted: Vec<(String, Color32)>,
}

impl ModeOverlay {
    pub fn new(colours: FlightModeColours) -> Self {
        Self {
            colours,
            plotted: Vec::new(),
        }
    }

    /// Bands for every interval overlapping `xlim`, clipped to it.
    ///
    /// Colours are assigned for every interval visited, visible or not, so the
    /// assignment does not depend on the current zoom.
    pub fn bands(
        &mut self,
        intervals: &[FlightModeInterval],
        clock: &mut DayClock,
        xlim: (f64, f64),
    ) -> Vec<ModeBand> {
        let mut out = Vec::new();
        for iv in intervals {
            let colour = self.colours.colour(&iv.mode);
            let d0 = clock.to_days(iv.start);
            let d1 = clock.to_days(iv.end);
            if d0 > xlim.1 || d1 < xlim.0 {
                continue;
            }
            out.push(ModeBand {
                mode: iv.mode.clone(),
                x0: d0.max(xlim.0),
                x1: d1.min(xlim.1),
                colour,
            });
            if !self.plotted.iter().any(|(m, _)| m == &iv.mode) {
                self.plotted.push((iv.mode.clone(), colour));
            }
        }
        out
    }

    /// Modes drawn so far, in first-drawn order. Entries accumulate across
    /// redraws, like a legend that only grows while zooming around.
    pub fn legend(&self) -> &[(String, Color32)] {
        &self.plotted
    }

    /// Legend patch colour for a band colour.
    pub fn legend_colour(c: Color32) -> Color32 {
        let a = (BAND_ALPHA * 1.5 * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), a)
    }

    pub fn band_fill(c: Color32) -> Color32 {
        let a = (BAND_ALPHA * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), a)
    }
}

/// Scan `source` for changes of `TYPE.field` and build the interval list.
///
/// A new interval starts whenever the mode value changes; the last one ends at
/// the final timestamp seen in the log. The source is rewound afterwards so it
/// can be graphed.
pub fn flightmodes_from_source(
    source: &mut dyn RecordSource,
    msg_type: &str,
    field: &str,
) -> Result<Vec<FlightModeInterval>> {
    let all = HashSet::new();
    let mut out: Vec<FlightModeInterval> = Vec::new();
    let mut current: Option<(String, f64)> = None;
    let mut last_t = None;
    while let Some(rec) = source.next_record(&all) {
        last_t = Some(rec.timestamp);
        if rec.msg_type != msg_type {
            continue;
        }
        let Some(mode) = rec.get(field).map(mode_name) else {
            continue;
        };
        match &current {
            Some((m, _)) if *m == mode => {}
            Some((m, t0)) => {
                out.push(FlightModeInterval::new(m.clone(), *t0, rec.timestamp));
                current = Some((mode, rec.timestamp));
            }
            None => current = Some((mode, rec.timestamp)),
        }
    }
    if let (Some((m, t0)), Some(t1)) = (current, last_t) {
        out.push(FlightModeInterval::new(m, t0, t1));
    }
    source.rewind()?;
    log::debug!(
        "{}: {} flight-mode intervals from {msg_type}.{field}",
        source.name(),
        out.len()
    );
    Ok(out)
}

fn mode_name(v: &Value) -> String {
    v.key_string()
}

/// Selection flags parallel to `intervals`: true for intervals whose mode is in `selected`.
pub fn selections_for(intervals: &[FlightModeInterval], selected: &[String]) -> Vec<bool> {
    intervals
        .iter()
        .map(|iv| selected.iter().any(|s| s.eq_ignore_ascii_case(&iv.mode)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::{Record, VecSource};

    #[test]
    fn palette_wraps_after_fifteen() {
        let mut c = FlightModeColours::new();
        let first = c.colour("M0");
        for i in 1..15 {
            c.colour(&format!("M{i}"));
        }
        assert_eq!(c.colour("M15"), first);
        assert_eq!(c.colour("M0"), first);
    }

    #[test]
    fn modes_from_source_track_changes() {
        let mut src = VecSource::new(
            "log",
            vec![
                Record::new("MODE", 0.0).with("Mode", "STABILIZE"),
                Record::new("ATT", 1.0).with("Roll", 1.0),
                Record::new("MODE", 2.0).with("Mode", "STABILIZE"),
                Record::new("MODE", 5.0).with("Mode", "AUTO"),
                Record::new("ATT", 9.0).with("Roll", 1.0),
            ],
        );
        let modes = flightmodes_from_source(&mut src, "MODE", "Mode").unwrap();
        assert_eq!(
            modes,
            vec![
                FlightModeInterval::new("STABILIZE", 0.0, 5.0),
                FlightModeInterval::new("AUTO", 5.0, 9.0),
            ]
        );
        // rewound
        assert!(src.next_record(&HashSet::new()).is_some());
    }
}
