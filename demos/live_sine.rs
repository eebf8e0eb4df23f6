//! Example: live strip chart fed from a producer thread
//!
//! What it demonstrates
//! - Feeding a live graph through `channel_live()` and `LiveSink`.
//! - Steering it from outside with a `LiveController` (pause after 5 s,
//!   resume after 8 s).
//!
//! How to run
//! ```bash
//! cargo run --example live_sine
//! ```

use std::time::Duration;

use flightplot::{channel_live, run_live, LiveController, LiveGraphConfig};

fn main() -> flightplot::Result<()> {
    let (sink, rx) = channel_live();

    let mut cfg = LiveGraphConfig::new(vec!["ATT.Roll", "ATT.Pitch"]);
    cfg.title = "Attitude".into();
    cfg.labels = vec![Some("Roll".into()), None];
    cfg.timespan = 10.0;
    cfg.tick_resolution = 0.05;
    let ctrl = LiveController::new();
    cfg.controller = Some(ctrl.clone());

    // Producer: 50 Hz roll/pitch wobble
    std::thread::spawn(move || {
        let mut t = 0.0f64;
        loop {
            let roll = 20.0 * (0.5 * t).sin();
            let pitch = 5.0 * (1.3 * t).cos();
            // Ignore error if the UI closed (receiver dropped)
            if sink.send_values(&[roll, pitch]).is_err() {
                break;
            }
            t += 0.02;
            std::thread::sleep(Duration::from_millis(20));
        }
    });

    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(5));
        ctrl.pause();
        std::thread::sleep(Duration::from_secs(3));
        ctrl.resume();
    });

    run_live(cfg, rx)
}
