use flightplot::data::flightmode::{
    flightmodes_from_source, selections_for, FlightModeColours, FlightModeInterval, ModeOverlay,
};
use flightplot::data::record::{Record, VecSource};
use flightplot::data::time::DayClock;

const T0: f64 = 1_700_000_000.0;

#[test]
fn colours_are_stable_per_mode() {
    let mut c = FlightModeColours::new();
    let a = c.colour("AUTO");
    let l = c.colour("LOITER");
    assert_ne!(a, l);
    assert_eq!(c.colour("AUTO"), a);
    assert_eq!(c.get("LOITER"), Some(l));
}

#[test]
fn bands_are_clipped_and_legend_is_compact() {
    let modes = vec![
        FlightModeInterval::new("STABILIZE", T0, T0 + 10.0),
        FlightModeInterval::new("AUTO", T0 + 10.0, T0 + 20.0),
        FlightModeInterval::new("RTL", T0 + 20.0, T0 + 30.0),
        FlightModeInterval::new("AUTO", T0 + 30.0, T0 + 40.0),
    ];
    let mut clock = DayClock::new(0.0);
    let d = |s: f64| (T0 + s) / 86_400.0;
    let mut overlay = ModeOverlay::default();
    let bands = overlay.bands(&modes, &mut clock, (d(5.0), d(25.0)));

    assert_eq!(bands.len(), 3);
    assert!((bands[0].x0 - d(5.0)).abs() < 1e-9);
    assert!((bands[2].x1 - d(25.0)).abs() < 1e-9);
    let legend: Vec<&str> = overlay.legend().iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(legend, vec!["STABILIZE", "AUTO", "RTL"]);
    // every interval got a colour, even the one outside the view
    assert_eq!(overlay.colours.get("AUTO"), Some(bands[1].colour));
}

#[test]
fn selection_is_case_insensitive() {
    let modes = vec![
        FlightModeInterval::new("STABILIZE", 0.0, 1.0),
        FlightModeInterval::new("AUTO", 1.0, 2.0),
    ];
    assert_eq!(selections_for(&modes, &["auto".to_string()]), vec![false, true]);
    assert_eq!(selections_for(&modes, &[]), vec![false, false]);
}

#[test]
fn numeric_modes_are_named_by_value() {
    let mut src = VecSource::new(
        "log",
        vec![
            Record::new("MODE", T0).with("Mode", 0.0),
            Record::new("MODE", T0 + 3.0).with("Mode", 3.0),
            Record::new("ATT", T0 + 4.0).with("Roll", 0.0),
        ],
    );
    let modes = flightmodes_from_source(&mut src, "MODE", "Mode").unwrap();
    assert_eq!(
        modes,
        vec![
            FlightModeInterval::new("0", T0, T0 + 3.0),
            FlightModeInterval::new("3", T0 + 3.0, T0 + 4.0),
        ]
    );
}
