//! flightplot: telemetry graphs from flight logs.
//!
//! - `data`: records, field expressions, sample extraction, flight-mode
//!   overlay and the [`Figure`] model
//! - `config`: graph and live-graph settings
//! - `export`: PNG/SVG/HTML output via plotters
//! - `app`: interactive egui windows
//! - `sink`/`controllers`: feeding and steering a live graph

pub mod app;
pub mod config;
pub mod controllers;
pub mod data;
pub mod error;
pub mod export;
pub mod sink;

pub use app::{run_graph, run_live, GraphApp, LiveGraphApp};
pub use config::{
    FlightModeDisplay, GraphConfig, LegendPosition, LineStyleSpec, LiveGraphConfig, MarkerStyle,
};
pub use controllers::{LiveController, LiveInfo, XRangeLink};
pub use data::field::FieldSpec;
pub use data::figure::Figure;
pub use data::flightmode::{FlightModeColours, FlightModeInterval};
pub use data::graph::{GraphBuilder, Sample, SourceSeries};
pub use data::record::{JsonlLog, Record, RecordSource, Value, VecSource, ZeroTimeBase};
pub use error::{GraphError, Result};
pub use sink::{channel_live, LiveReceiver, LiveSink, LiveValue};
