use std::path::Path;

use flightplot::config::GraphConfig;
use flightplot::data::figure::Figure;
use flightplot::data::graph::GraphBuilder;
use flightplot::data::record::{Record, RecordSource, VecSource};
use flightplot::data::time::DayClock;
use flightplot::{export, GraphError};

fn figure(cfg: &GraphConfig) -> Result<Figure, GraphError> {
    let mut b = GraphBuilder::new(&["ATT.Roll", "ATT.Pitch:2"]);
    let records = (0..10)
        .map(|i| {
            Record::new("ATT", 1_700_000_000.0 + i as f64)
                .with("Roll", i as f64)
                .with("Pitch", 100.0 - i as f64)
        })
        .collect();
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(VecSource::new("m", records))];
    let series = b.process(&mut sources, &[], &[]);
    Figure::build(cfg, b.fields(), &series, Vec::new(), DayClock::default())
}

#[test]
fn unknown_extension_is_rejected() {
    let mut fig = figure(&GraphConfig::default()).unwrap();
    let err = export::save_figure(&mut fig, Path::new("graph.bmp"), (320, 200)).unwrap_err();
    assert!(matches!(err, GraphError::UnsupportedOutput(_)));
}

#[test]
fn label_count_must_match() {
    let cfg = GraphConfig {
        labels: Some(vec!["only one".into()]),
        ..Default::default()
    };
    let err = figure(&cfg).err().unwrap();
    assert!(matches!(err, GraphError::LabelCount { labels: 1, expected: 2 }));
}

#[test]
fn secondary_axis_maps_onto_primary() {
    let mut fig = figure(&GraphConfig::default()).unwrap();
    assert!(fig.has_secondary());
    let (lo, hi) = fig.rescale(fig.x_range);
    let pitch = fig.traces.iter().find(|t| t.label == "ATT.Pitch").unwrap();
    let mapped = fig.plot_points(pitch);
    for p in mapped {
        assert!(p[1] >= lo - 1e-9 && p[1] <= hi + 1e-9);
    }
    assert!(fig.cursor_text(fig.x_range.0, lo).contains("Right="));
}

#[test]
fn empty_series_is_no_data() {
    let mut b = GraphBuilder::new(&["ATT.Roll"]);
    let mut sources: Vec<Box<dyn RecordSource>> = vec![Box::new(VecSource::new("m", vec![]))];
    let series = b.process(&mut sources, &[], &[]);
    let err = Figure::build(
        &GraphConfig::default(),
        b.fields(),
        &series,
        Vec::new(),
        DayClock::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, GraphError::NoData));
}
