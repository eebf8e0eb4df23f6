//! Batch sample extraction.
//!
//! [`GraphBuilder`] streams records from one or more sources, keeps a
//! [`VarTable`] of the latest message per type, evaluates every field against
//! it and appends `(x, value)` samples to one series per field. Each source
//! produces its own [`SourceSeries`].

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::GraphConfig;
use crate::data::expr::{Evaluator, ExprEvaluator};
use crate::data::field::{message_types, parse_fields, FieldSpec};
use crate::data::flightmode::FlightModeInterval;
use crate::data::record::{Record, RecordSource, Value, VarTable};
use crate::data::time::DayClock;

/// Environment variable that turns on logging of per-record evaluation failures.
pub const DEBUG_ENV: &str = "FLIGHTPLOT_DEBUG";

/// One extracted point. `y` is a number or, for annotation series, text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub x: f64,
    pub y: Value,
}

/// Samples of every field for one source, indexed like the builder's fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceSeries {
    pub source: String,
    pub series: Vec<Vec<Sample>>,
}

impl SourceSeries {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(Vec::is_empty)
    }

    pub fn sample_count(&self) -> usize {
        self.series.iter().map(Vec::len).sum()
    }
}

/// Write extracted series as pretty JSON, keyed by field expression.
pub fn dump_series<W: std::io::Write>(
    mut out: W,
    fields: &[FieldSpec],
    sources: &[SourceSeries],
) -> crate::error::Result<()> {
    #[derive(Serialize)]
    struct Dump<'a> {
        fields: Vec<&'a str>,
        sources: &'a [SourceSeries],
    }
    let dump = Dump {
        fields: fields.iter().map(|f| f.expression.as_str()).collect(),
        sources,
    };
    serde_json::to_writer_pretty(&mut out, &dump)
        .map_err(|e| crate::error::GraphError::Export(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}

/// Rate-limit key: message type, instance value, effective field expression.
type RateKey = (String, Option<String>, String);

pub struct GraphBuilder {
    fields: Vec<FieldSpec>,
    /// Types pulled from the sources: those named by fields, condition and x axis.
    subscribed: HashSet<String>,
    condition: Option<String>,
    xaxis: Option<String>,
    max_message_rate: f64,
    evaluator: Box<dyn Evaluator>,
    clock: DayClock,
    last_accept: HashMap<RateKey, f64>,
    debug: bool,
}

impl GraphBuilder {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        let fields = parse_fields(fields);
        let subscribed = message_types(&fields);
        Self {
            fields,
            subscribed,
            condition: None,
            xaxis: None,
            max_message_rate: 0.0,
            evaluator: Box::new(ExprEvaluator::new()),
            clock: DayClock::default(),
            last_accept: HashMap::new(),
            debug: std::env::var_os(DEBUG_ENV).is_some(),
        }
    }

    /// Builder with the extraction settings of `cfg`.
    pub fn from_config<S: AsRef<str>>(fields: &[S], cfg: &GraphConfig) -> Self {
        let mut b = Self::new(fields);
        b.set_condition(cfg.condition.clone());
        b.set_xaxis(cfg.xaxis.clone());
        b.set_max_message_rate(cfg.max_message_rate);
        b.set_timeshift(cfg.timeshift);
        b
    }

    pub fn set_condition(&mut self, condition: Option<String>) {
        self.condition = condition.filter(|c| !c.trim().is_empty());
        self.refresh_subscriptions();
    }

    pub fn set_xaxis(&mut self, xaxis: Option<String>) {
        self.xaxis = xaxis.filter(|x| !x.trim().is_empty());
        self.refresh_subscriptions();
    }

    /// Cap samples per (type, instance, field) at `rate_hz`; `0` disables.
    pub fn set_max_message_rate(&mut self, rate_hz: f64) {
        self.max_message_rate = rate_hz.max(0.0);
    }

    pub fn set_timeshift(&mut self, timeshift: f64) {
        self.clock = DayClock::new(timeshift);
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = evaluator;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn message_types(&self) -> &HashSet<String> {
        &self.subscribed
    }

    pub fn xaxis(&self) -> Option<&str> {
        self.xaxis.as_deref()
    }

    /// Time origin of the last run, used to place flight-mode bands.
    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    fn refresh_subscriptions(&mut self) {
        let mut types = message_types(&self.fields);
        for extra in [&self.condition, &self.xaxis].into_iter().flatten() {
            types.extend(FieldSpec::parse(extra).msg_types);
        }
        self.subscribed = types;
    }

    /// Extract every source in order.
    ///
    /// `selections` runs parallel to `flightmodes`; when any entry is true only
    /// records inside selected intervals are kept.
    pub fn process(
        &mut self,
        sources: &mut [Box<dyn RecordSource>],
        flightmodes: &[FlightModeInterval],
        selections: &[bool],
    ) -> Vec<SourceSeries> {
        self.clock.reset();
        sources
            .iter_mut()
            .enumerate()
            .map(|(i, src)| self.process_source(i, src.as_mut(), flightmodes, selections))
            .collect()
    }

    /// Extract one source. `index` is the source's position in the run; fields
    /// marked first-only take no data when it is non-zero.
    pub fn process_source(
        &mut self,
        index: usize,
        source: &mut dyn RecordSource,
        flightmodes: &[FlightModeInterval],
        selections: &[bool],
    ) -> SourceSeries {
        let mut out = SourceSeries {
            source: source.name().to_string(),
            series: vec![Vec::new(); self.fields.len()],
        };
        if self.subscribed.is_empty() {
            log::warn!("fields reference no message types; nothing to extract");
            return out;
        }
        if let Some(first) = flightmodes.first() {
            self.clock.to_days(first.start);
        }
        let filter_modes = selections.iter().any(|s| *s);

        // rate limits apply per source
        self.last_accept.clear();
        let mut vars = VarTable::new();
        let mut idx = 0;
        let mut seen = 0usize;
        while let Some(rec) = source.next_record(&self.subscribed) {
            seen += 1;
            vars.insert_latest(&rec);
            if let Some(cond) = &self.condition {
                if !self.evaluator.evaluate_condition(cond, &vars) {
                    continue;
                }
            }
            let tdays = self.clock.to_days(rec.timestamp);

            if !filter_modes {
                self.add_data(tdays, &rec, &mut vars, index, &mut out.series);
            } else if idx < flightmodes.len() && rec.timestamp >= flightmodes[idx].end {
                idx += 1;
            } else if selections.get(idx).copied().unwrap_or(false) {
                self.add_data(tdays, &rec, &mut vars, index, &mut out.series);
            }
        }
        log::info!(
            "{}: {} records, {} samples",
            out.source,
            seen,
            out.sample_count()
        );
        out
    }

    /// Evaluate every field that references `rec`'s type and append the samples.
    pub fn add_data(
        &mut self,
        tdays: f64,
        rec: &Record,
        vars: &mut VarTable,
        source_index: usize,
        series: &mut [Vec<Sample>],
    ) {
        let mtype = rec.msg_type.as_str();
        for (i, f) in self.fields.iter().enumerate() {
            if !f.uses_type(mtype) || (f.first_only && source_index > 0) {
                continue;
            }
            let mut expr = Cow::Borrowed(f.expression.as_str());
            let mut instance = None;
            if let Some(accepted) = f.instance_values(mtype) {
                let Some(ins) = rec.instance_value() else {
                    continue;
                };
                let key = ins.key_string();
                if !accepted.contains(&key) {
                    continue;
                }
                vars.insert_instance(key.clone(), rec);
                if ins.is_text() {
                    let bare = format!("{mtype}[{key}]");
                    let quoted = format!("{mtype}[\"{key}\"]");
                    expr = Cow::Owned(expr.replace(&bare, &quoted));
                }
                instance = Some(key);
            }

            if self.max_message_rate > 0.0 {
                let key = (mtype.to_string(), instance.clone(), expr.to_string());
                if let Some(last) = self.last_accept.get(&key) {
                    if rec.timestamp - last < 1.0 / self.max_message_rate {
                        continue;
                    }
                }
                self.last_accept.insert(key, rec.timestamp);
            }

            let mut value = None;
            if instance.is_none() {
                if let Some((t, attr)) = &f.simple {
                    value = vars.latest(t).and_then(|r| r.get(attr)).cloned();
                    if value.is_none() && self.debug {
                        log::debug!("{t}.{attr} not available");
                    }
                }
            }
            if value.is_none() {
                match self.evaluator.evaluate(&expr, vars) {
                    Ok(v) => value = v,
                    Err(e) => {
                        if self.debug {
                            log::debug!("{expr}: {e}");
                        }
                    }
                }
            }
            let y = match value {
                Some(Value::Bool(b)) => Value::Number(if b { 1.0 } else { 0.0 }),
                Some(Value::Array(_)) => {
                    if self.debug {
                        log::debug!("{expr}: array value is not plottable");
                    }
                    continue;
                }
                Some(v) => v,
                None => continue,
            };

            let x = match &self.xaxis {
                None => tdays,
                Some(xe) => match self.evaluator.evaluate(xe, vars) {
                    Ok(Some(v)) => match v.as_f64() {
                        Some(x) => x,
                        None => continue,
                    },
                    Ok(None) => continue,
                    Err(e) => {
                        if self.debug {
                            log::debug!("{xe}: {e}");
                        }
                        continue;
                    }
                },
            };
            series[i].push(Sample { x, y });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::VecSource;

    fn run(builder: &mut GraphBuilder, records: Vec<Record>) -> SourceSeries {
        let mut src = VecSource::new("mem", records);
        builder.process_source(0, &mut src, &[], &[])
    }

    #[test]
    fn text_instance_is_quoted() {
        let mut b = GraphBuilder::new(&["ESC[A].RPM"]);
        let s = run(
            &mut b,
            vec![
                Record::new("ESC", 0.0)
                    .with("Id", "A")
                    .with("RPM", 1000.0)
                    .with_instance_field("Id"),
                Record::new("ESC", 1.0)
                    .with("Id", "B")
                    .with("RPM", 5.0)
                    .with_instance_field("Id"),
            ],
        );
        let ys: Vec<_> = s.series[0].iter().map(|p| p.y.clone()).collect();
        assert_eq!(ys, vec![Value::Number(1000.0)]);
    }

    #[test]
    fn missing_instance_field_skips() {
        let mut b = GraphBuilder::new(&["GPS[0].Alt"]);
        let s = run(&mut b, vec![Record::new("GPS", 0.0).with("Alt", 10.0)]);
        assert!(s.is_empty());
    }

    #[test]
    fn custom_xaxis_requires_numeric() {
        let mut b = GraphBuilder::new(&["ATT.Roll"]);
        b.set_xaxis(Some("ATT.Pitch".into()));
        let s = run(
            &mut b,
            vec![
                Record::new("ATT", 0.0).with("Roll", 1.0).with("Pitch", 2.0),
                Record::new("ATT", 1.0).with("Roll", 3.0).with("Pitch", "bad"),
            ],
        );
        assert_eq!(s.series[0].len(), 1);
        assert_eq!(s.series[0][0].x, 2.0);
    }
}
