use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use flightplot::data::expr::{Evaluator, ExprError};
use flightplot::data::flightmode::FlightModeInterval;
use flightplot::data::graph::GraphBuilder;
use flightplot::data::record::{JsonlLog, Record, RecordSource, Value, VarTable, VecSource};

const T0: f64 = 1_700_000_000.0;

fn ys(series: &[flightplot::Sample]) -> Vec<f64> {
    series.iter().map(|s| s.y.as_f64().unwrap()).collect()
}

fn one(builder: &mut GraphBuilder, records: Vec<Record>) -> flightplot::SourceSeries {
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(VecSource::new("mem", records))];
    builder.process(&mut sources, &[], &[]).remove(0)
}

#[test]
fn simple_field_follows_time() {
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    let s = one(
        &mut b,
        (0..3)
            .map(|i| Record::new("ATT", T0 + i as f64).with("Roll", i as f64 * 10.0))
            .collect(),
    );
    assert_eq!(ys(&s.series[0]), vec![0.0, 10.0, 20.0]);
    let dx = s.series[0][1].x - s.series[0][0].x;
    assert!((dx * 86_400.0 - 1.0).abs() < 1e-6);
    assert!((s.series[0][0].x - T0 / 86_400.0).abs() < 1e-9);
}

#[test]
fn compound_waits_for_every_type() {
    let mut b = GraphBuilder::new(&["ATT.Roll", "ATT.Roll + GPS.Alt"]);
    let s = one(
        &mut b,
        vec![
            Record::new("ATT", T0).with("Roll", 1.0),
            Record::new("GPS", T0 + 1.0).with("Alt", 10.0),
            Record::new("ATT", T0 + 2.0).with("Roll", 2.0),
        ],
    );
    assert_eq!(ys(&s.series[0]), vec![1.0, 2.0]);
    assert_eq!(ys(&s.series[1]), vec![11.0, 12.0]);
}

#[test]
fn max_rate_limits_samples() {
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    b.set_max_message_rate(2.0);
    let s = one(
        &mut b,
        (0..=8)
            .map(|i| Record::new("ATT", T0 + i as f64 * 0.25).with("Roll", i as f64))
            .collect(),
    );
    assert_eq!(ys(&s.series[0]), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
}

#[test]
fn max_rate_at_ten_hz_keeps_two_per_second() {
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    b.set_max_message_rate(2.0);
    let s = one(
        &mut b,
        (0..=30)
            .map(|i| Record::new("ATT", T0 + i as f64 * 0.1).with("Roll", i as f64))
            .collect(),
    );
    // y is the record index; ten records span one second
    let kept = ys(&s.series[0]);
    assert!(kept.len() >= 6, "kept {kept:?}");
    for a in &kept {
        let in_window = kept.iter().filter(|k| **k >= *a && **k < *a + 10.0).count();
        assert!(in_window <= 2, "{in_window} samples in the second after {a}");
    }
}

#[test]
fn max_rate_restarts_for_each_source() {
    let log = || {
        VecSource::new(
            "log",
            (0..=8)
                .map(|i| Record::new("ATT", T0 + i as f64 * 0.25).with("Roll", i as f64))
                .collect(),
        )
    };
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    b.set_max_message_rate(2.0);
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(log()), Box::new(log())];
    let out = b.process(&mut sources, &[], &[]);
    assert_eq!(ys(&out[0].series[0]), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    assert_eq!(ys(&out[1].series[0]), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
}

/// Records every expression it is asked for and answers with a constant.
struct RecordingEvaluator {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Evaluator for RecordingEvaluator {
    fn evaluate(&self, expr: &str, _vars: &VarTable) -> Result<Option<Value>, ExprError> {
        self.calls.borrow_mut().push(expr.to_string());
        Ok(Some(Value::Number(42.0)))
    }
}

#[test]
fn custom_evaluator_handles_conditions_and_compound_fields() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut b = GraphBuilder::new(&["ATT.Roll", "ATT.Roll * 2"]);
    b.set_condition(Some("ATT.Roll > 0".into()));
    b.set_evaluator(Box::new(RecordingEvaluator {
        calls: calls.clone(),
    }));
    let s = one(
        &mut b,
        vec![
            Record::new("ATT", T0).with("Roll", 1.0),
            Record::new("ATT", T0 + 1.0).with("Roll", 2.0),
        ],
    );
    // plain TYPE.field reads bypass the evaluator
    assert_eq!(ys(&s.series[0]), vec![1.0, 2.0]);
    assert_eq!(ys(&s.series[1]), vec![42.0, 42.0]);
    assert_eq!(
        *calls.borrow(),
        vec!["ATT.Roll > 0", "ATT.Roll * 2", "ATT.Roll > 0", "ATT.Roll * 2"]
    );
}

#[test]
fn instance_selector_filters_records() {
    let mut b = GraphBuilder::new(&["GPS[1].Alt"]);
    let s = one(
        &mut b,
        vec![
            Record::new("GPS", T0).with("I", 0.0).with("Alt", 5.0).with_instance_field("I"),
            Record::new("GPS", T0 + 1.0).with("I", 1.0).with("Alt", 7.0).with_instance_field("I"),
            Record::new("GPS", T0 + 2.0).with("I", 0.0).with("Alt", 6.0).with_instance_field("I"),
        ],
    );
    assert_eq!(ys(&s.series[0]), vec![7.0]);
}

#[test]
fn condition_rejects_records() {
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    b.set_condition(Some("ATT.Roll > 0".into()));
    let s = one(
        &mut b,
        vec![
            Record::new("ATT", T0).with("Roll", -1.0),
            Record::new("ATT", T0 + 1.0).with("Roll", 2.0),
            Record::new("ATT", T0 + 2.0).with("Roll", 3.0),
        ],
    );
    assert_eq!(ys(&s.series[0]), vec![2.0, 3.0]);
}

#[test]
fn first_only_fields_ignore_later_sources() {
    let mut b = GraphBuilder::new(&["ATT.Roll:1", "ATT.Pitch"]);
    let log = || {
        VecSource::new(
            "log",
            vec![Record::new("ATT", T0).with("Roll", 1.0).with("Pitch", 2.0)],
        )
    };
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(log()), Box::new(log())];
    let out = b.process(&mut sources, &[], &[]);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].series[0].len(), 1);
    assert!(out[1].series[0].is_empty());
    assert_eq!(out[1].series[1].len(), 1);
}

#[test]
fn selected_flight_modes_only() {
    let modes = vec![
        FlightModeInterval::new("STABILIZE", T0, T0 + 5.0),
        FlightModeInterval::new("AUTO", T0 + 5.0, T0 + 10.0),
    ];
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    let records = [1.0, 2.0, 5.5, 6.0, 7.0]
        .iter()
        .map(|dt| Record::new("ATT", T0 + dt).with("Roll", *dt))
        .collect();
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(VecSource::new("m", records))];
    let out = b.process(&mut sources, &modes, &[false, true]);
    // the record that crosses into the next interval only advances it
    assert_eq!(ys(&out[0].series[0]), vec![6.0, 7.0]);
}

#[test]
fn text_values_are_kept() {
    let mut b = GraphBuilder::new(&["MSG.Message"]);
    let s = one(&mut b, vec![Record::new("MSG", T0).with("Message", "Armed")]);
    assert_eq!(s.series[0][0].y, Value::from("Armed"));
}

#[test]
fn reads_jsonl_logs() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"fmt":"GPS","instance_field":"I"}}"#).unwrap();
    writeln!(file, r#"{{"type":"ATT","t":{T0},"Roll":1.5}}"#).unwrap();
    writeln!(file, "not json").unwrap();
    writeln!(file, r#"{{"type":"GPS","t":{},"I":0,"Alt":100}}"#, T0 + 1.0).unwrap();
    writeln!(file, r#"{{"type":"GPS","t":{},"I":1,"Alt":200}}"#, T0 + 1.0).unwrap();
    writeln!(file, r#"{{"type":"ATT","t":{},"Roll":2.5}}"#, T0 + 2.0).unwrap();
    file.flush().unwrap();

    let log = JsonlLog::open(file.path()).unwrap();
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(log)];
    let mut b = GraphBuilder::new(&["ATT.Roll", "GPS[1].Alt"]);
    let out = b.process(&mut sources, &[], &[]);
    assert_eq!(ys(&out[0].series[0]), vec![1.5, 2.5]);
    assert_eq!(ys(&out[0].series[1]), vec![200.0]);
}
