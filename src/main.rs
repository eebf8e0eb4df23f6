//! flightplot command-line tool
//!
//! Graphs fields from one or more JSON-lines flight logs, either in an
//! interactive window or straight to an image file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use flightplot::config::{
    FlightModeDisplay, GraphConfig, LegendPosition, LineStyleSpec, MarkerStyle,
};
use flightplot::data::expr::check_syntax;
use flightplot::data::figure::Figure;
use flightplot::data::flightmode::{flightmodes_from_source, selections_for};
use flightplot::data::graph::{dump_series, GraphBuilder};
use flightplot::data::record::{JsonlLog, RecordSource, ZeroTimeBase};
use flightplot::{export, run_graph, GraphError};

/// Graph telemetry fields from flight logs
#[derive(Parser, Debug)]
#[command(name = "flightplot")]
#[command(about = "Graph fields from JSON-lines flight logs", long_about = None)]
#[command(version)]
struct Args {
    /// Log files and field expressions, in any order (existing paths are logs)
    #[arg(required = true, value_name = "LOG|FIELD")]
    inputs: Vec<String>,

    /// Only use records for which this expression is true
    #[arg(long)]
    condition: Option<String>,

    /// Comma-separated legend labels, one per field per log
    #[arg(long)]
    labels: Option<String>,

    /// Legend position for the left axis
    #[arg(long, default_value = "upper left")]
    legend: LegendPosition,

    /// Legend position for the right axis
    #[arg(long, default_value = "upper right")]
    legend2: LegendPosition,

    /// Legend position for flight modes
    #[arg(long, default_value = "lower left")]
    legend_flightmode: LegendPosition,

    /// Point marker (+, ., o, x, s, D, ^, *, none)
    #[arg(long)]
    marker: Option<MarkerStyle>,

    /// Line style (-, --, :, -., none)
    #[arg(long)]
    linestyle: Option<LineStyleSpec>,

    /// Expression to use as the x axis instead of time
    #[arg(long)]
    xaxis: Option<String>,

    /// Graph title
    #[arg(long)]
    title: Option<String>,

    /// Use the same colours for every log
    #[arg(long)]
    multi: bool,

    /// Make every log start at time zero
    #[arg(long)]
    zero_time_base: bool,

    /// Flight-mode overlay: 0 off, 1 bands with legend, 2 mode legend only
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    show_flightmode: u8,

    /// Vehicle dialect (informational; JSON-lines logs are self-describing)
    #[arg(long)]
    dialect: Option<String>,

    /// Write the graph to this file (.png, .svg or .html) instead of opening a window
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output image size in pixels, WIDTHxHEIGHT
    #[arg(long, default_value = "1600x1000", value_parser = parse_size)]
    size: (u32, u32),

    /// Shift all timestamps by this many seconds
    #[arg(long, default_value_t = 0.0)]
    timeshift: f64,

    /// Draw grid lines
    #[arg(long)]
    grid: bool,

    /// Keep at most this many samples per second per field (0 = unlimited)
    #[arg(long, default_value_t = 0.0)]
    max_rate: f64,

    /// Field holding the flight mode, as TYPE.field
    #[arg(long, default_value = "MODE.Mode")]
    flightmode_field: String,

    /// Only graph records inside these flight modes (can be repeated)
    #[arg(long, value_name = "MODE")]
    select_mode: Vec<String>,

    /// Write the extracted samples as JSON
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let (logs, fields): (Vec<String>, Vec<String>) =
        args.inputs.iter().cloned().partition(|s| Path::new(s).exists());
    if logs.is_empty() {
        bail!("no log files given");
    }
    if fields.is_empty() {
        bail!("no fields given");
    }
    if let Some(d) = &args.dialect {
        log::debug!("dialect {d} ignored for JSON-lines logs");
    }

    for (flag, expr) in [("--condition", &args.condition), ("--xaxis", &args.xaxis)] {
        if let Some(expr) = expr {
            check_syntax(expr).with_context(|| format!("{flag} {expr}"))?;
        }
    }

    let cfg = graph_config(&args);

    let mut sources: Vec<Box<dyn RecordSource>> = Vec::with_capacity(logs.len());
    for path in &logs {
        let log = JsonlLog::open(path).with_context(|| format!("opening {path}"))?;
        if args.zero_time_base {
            sources.push(Box::new(ZeroTimeBase::new(log)));
        } else {
            sources.push(Box::new(log));
        }
    }

    let flightmodes = if cfg.show_flightmode.enabled() || !args.select_mode.is_empty() {
        let (msg_type, field) = args
            .flightmode_field
            .split_once('.')
            .with_context(|| format!("bad flight-mode field {}", args.flightmode_field))?;
        flightmodes_from_source(sources[0].as_mut(), msg_type, field)?
    } else {
        Vec::new()
    };
    let selections = selections_for(&flightmodes, &args.select_mode);

    let mut builder = GraphBuilder::from_config(&fields, &cfg);
    let series = builder.process(&mut sources, &flightmodes, &selections);

    if let Some(path) = &args.dump {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        dump_series(std::io::BufWriter::new(file), builder.fields(), &series)?;
        log::info!("wrote samples to {}", path.display());
    }

    let mut fig = match Figure::build(
        &cfg,
        builder.fields(),
        &series,
        flightmodes,
        builder.clock().clone(),
    ) {
        Ok(fig) => fig,
        Err(GraphError::NoData) => {
            log::warn!("No data to graph");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match cfg.output.clone() {
        Some(path) => export::save_figure(&mut fig, &path, cfg.output_size)?,
        None => run_graph(fig, cfg)?,
    }
    Ok(())
}

fn graph_config(args: &Args) -> GraphConfig {
    GraphConfig {
        condition: args.condition.clone(),
        xaxis: args.xaxis.clone(),
        timeshift: args.timeshift,
        max_message_rate: args.max_rate,
        title: args.title.clone(),
        labels: args
            .labels
            .as_ref()
            .map(|l| l.split(',').map(|s| s.trim().to_string()).collect()),
        legend: args.legend,
        legend2: args.legend2,
        legend_flightmode: args.legend_flightmode,
        marker: args.marker,
        linestyle: args.linestyle,
        multi: args.multi,
        show_flightmode: FlightModeDisplay::from_level(args.show_flightmode),
        grid: args.grid,
        output: args.output.clone(),
        output_size: args.size,
        ..Default::default()
    }
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s}"))?;
    let w = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
