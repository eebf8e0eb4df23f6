use flightplot::data::live::{CloseReason, LiveWindow, TickOutcome};
use flightplot::sink::{channel_live, LiveValue};

fn window(fields: &[&str]) -> LiveWindow {
    LiveWindow::new(fields.iter().map(|s| s.to_string()).collect(), 0.1, 1.0)
}

#[test]
fn single_update_never_draws() {
    let mut w = window(&["A", "B"]);
    let out = w.tick(Some(vec![Some(1.0.into()), Some(2.0.into())]));
    assert_eq!(out, TickOutcome::Waiting);
    assert_eq!(w.sample_counts(), vec![1, 1]);
    // the held values are reused on the next tick
    assert_eq!(w.tick(None), TickOutcome::Draw);
}

#[test]
fn missing_field_defers_drawing() {
    let mut w = window(&["A", "B"]);
    for _ in 0..5 {
        assert_eq!(w.tick(Some(vec![Some(1.0.into()), None])), TickOutcome::Waiting);
    }
    assert_eq!(w.sample_counts(), vec![5, 0]);
}

#[test]
fn clear_discards_history() {
    let mut w = window(&["A", "B"]);
    for i in 0..4 {
        w.tick(Some(vec![Some((i as f64).into()), Some(0.0.into())]));
    }
    w.request_clear();
    let out = w.tick(Some(vec![Some(100.0.into()), None]));
    assert_eq!(out, TickOutcome::Waiting);
    assert_eq!(w.sample_counts(), vec![1, 0]);
    let ys: Vec<f64> = w.series(0).iter().map(|p| p[1]).collect();
    assert_eq!(ys, vec![100.0]);
}

#[test]
fn array_value_closes() {
    let mut w = window(&["A"]);
    let out = w.tick(Some(vec![Some(LiveValue::Array(vec![1.0, 2.0]))]));
    assert_eq!(
        out,
        TickOutcome::Close(CloseReason::ArrayValue {
            field: "A".into(),
            len: 2
        })
    );
    assert!(w.is_closed());
    assert!(matches!(w.tick(None), TickOutcome::Close(_)));
}

#[test]
fn paused_window_still_clears_and_closes() {
    let mut w = window(&["A"]);
    w.tick(Some(vec![Some(1.0.into())]));
    w.set_paused(true);
    w.request_clear();
    assert_eq!(w.tick(Some(vec![Some(2.0.into())])), TickOutcome::Paused);
    assert_eq!(w.sample_counts(), vec![0]);
    w.request_close();
    assert_eq!(w.tick(None), TickOutcome::Close(CloseReason::Requested));
}

#[test]
fn channel_is_latest_wins() {
    let (tx, mut rx) = channel_live();
    tx.send_values(&[1.0]).unwrap();
    tx.send_values(&[2.0]).unwrap();
    let mut w = window(&["A"]);
    w.tick(rx.latest());
    w.tick(rx.latest());
    let ys: Vec<f64> = w.series(0).iter().map(|p| p[1]).collect();
    assert_eq!(ys, vec![2.0, 2.0]);
    drop(tx);
    assert!(rx.latest().is_none());
    assert!(rx.is_disconnected());
}
