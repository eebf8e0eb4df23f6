//! Live strip-chart window.
//!
//! [`LiveGraphApp`] ticks a [`LiveWindow`] at the configured resolution,
//! feeding it the newest update from the channel, and redraws whenever the
//! window reports [`TickOutcome::Draw`].

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use egui::Color32;
use egui_plot::{Legend, Line, Plot};
use image::{Rgba, RgbaImage};

use crate::config::{LiveGraphConfig, MIN_TICK_RESOLUTION};
use crate::controllers::{LiveController, LiveInfo};
use crate::data::live::{CloseReason, LiveWindow, TickOutcome};
use crate::data::trace_look::TraceLook;
use crate::sink::LiveReceiver;

pub struct LiveGraphApp {
    window: LiveWindow,
    rx: LiveReceiver,
    labels: Vec<String>,
    colours: Vec<Color32>,
    tick: Duration,
    last_tick: Option<Instant>,
    /// Series as of the last `Draw`; kept while paused or waiting.
    shown: Vec<Vec<[f64; 2]>>,
    y_bounds: Option<(f64, f64)>,
    controller: Option<LiveController>,
    pending_screenshot: Option<PathBuf>,
    close_sent: bool,
}

impl LiveGraphApp {
    pub fn new(cfg: &mut LiveGraphConfig, rx: LiveReceiver) -> Self {
        let n = cfg.fields.len();
        let labels = (0..n).map(|i| cfg.label(i).to_string()).collect();
        let colours = (0..n)
            .map(|i| {
                cfg.colours
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| TraceLook::alloc_color(i))
            })
            .collect();
        Self {
            window: LiveWindow::new(cfg.fields.clone(), cfg.tick_resolution, cfg.timespan),
            rx,
            labels,
            colours,
            tick: Duration::try_from_secs_f64(cfg.tick_resolution.max(MIN_TICK_RESOLUTION))
                .unwrap_or(Duration::from_secs(1)),
            last_tick: None,
            shown: vec![Vec::new(); n],
            y_bounds: None,
            controller: cfg.controller.take(),
            pending_screenshot: None,
            close_sent: false,
        }
    }

    fn apply_controller(&mut self, ctx: &egui::Context) {
        let Some(ctrl) = &self.controller else {
            return;
        };
        if ctrl.take_close() {
            self.window.request_close();
        }
        if let Some(p) = ctrl.take_pause() {
            self.window.set_paused(p);
        }
        if ctrl.take_clear() {
            self.window.request_clear();
        }
        if let Some(path) = ctrl.take_screenshot_path() {
            self.pending_screenshot = Some(path);
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
        }
    }

    fn run_tick(&mut self, ctx: &egui::Context) {
        let due = self.last_tick.map_or(true, |t| t.elapsed() >= self.tick);
        if !due {
            return;
        }
        self.last_tick = Some(Instant::now());

        let update = self.rx.latest();
        if update.is_none() && self.rx.is_disconnected() {
            log::debug!("live sender disconnected");
        }
        match self.window.tick(update) {
            TickOutcome::Draw => {
                self.shown = (0..self.window.fields().len())
                    .map(|i| self.window.series(i))
                    .collect();
                self.y_bounds = self.window.y_bounds();
            }
            TickOutcome::Waiting | TickOutcome::Paused => {}
            TickOutcome::Close(reason) => {
                if let CloseReason::ArrayValue { field, len } = &reason {
                    log::error!("closing live graph: {field} delivered {len} values");
                }
                self.close(ctx);
            }
        }
        self.publish();
    }

    fn close(&mut self, ctx: &egui::Context) {
        if !self.close_sent {
            self.close_sent = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn publish(&self) {
        if let Some(ctrl) = &self.controller {
            ctrl.publish(LiveInfo {
                paused: self.window.is_paused(),
                samples: self.window.sample_counts(),
                closed: self.window.is_closed(),
            });
        }
    }

    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.pending_screenshot.is_none() {
            return;
        }
        let Some(image_arc) = ctx.input(|i| {
            i.events.iter().rev().find_map(|e| {
                if let egui::Event::Screenshot { image, .. } = e {
                    Some(image.clone())
                } else {
                    None
                }
            })
        }) else {
            return;
        };
        let Some(path) = self.pending_screenshot.take() else {
            return;
        };
        let egui::ColorImage {
            size: [w, h],
            pixels,
            ..
        } = &*image_arc;
        let mut out = RgbaImage::new(*w as u32, *h as u32);
        for y in 0..*h {
            for x in 0..*w {
                let p = pixels[y * *w + x];
                out.put_pixel(x as u32, y as u32, Rgba([p.r(), p.g(), p.b(), p.a()]));
            }
        }
        if let Err(e) = out.save(&path) {
            log::error!("failed to save live screenshot: {e}");
        } else {
            log::info!("saved live screenshot to {}", path.display());
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("live_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.window.is_paused() {
                    if ui.button("Resume").clicked() {
                        self.window.set_paused(false);
                    }
                } else if ui.button("Pause").clicked() {
                    self.window.set_paused(true);
                }
                if ui.button("Clear").clicked() {
                    self.window.request_clear();
                }
                if ui.button("Save PNG").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_file_name("live.png")
                        .add_filter("PNG", &["png"])
                        .save_file()
                    {
                        self.pending_screenshot = Some(path);
                        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
                    }
                }
                if ui.button("Close").clicked() {
                    self.window.request_close();
                }
                ui.separator();
                let counts = self.window.sample_counts();
                ui.label(format!(
                    "{} / {} samples",
                    counts.iter().copied().min().unwrap_or(0),
                    self.window.capacity()
                ));
            });
        });
    }

    fn plot(&self, ui: &mut egui::Ui) {
        let (x0, x1) = self.window.x_bounds();
        let plot = Plot::new("live_plot")
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_drag(false)
            .legend(Legend::default())
            .x_axis_formatter(|x, _range| format!("{:.1}s", x.value));
        plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds_x(x0..=x1);
            if let Some((y0, y1)) = self.y_bounds {
                plot_ui.set_plot_bounds_y(y0..=y1);
            }
            for (i, pts) in self.shown.iter().enumerate() {
                if pts.is_empty() {
                    continue;
                }
                plot_ui.line(
                    Line::new(&self.labels[i], pts.clone())
                        .color(self.colours[i])
                        .width(1.5),
                );
            }
        });
    }
}

impl eframe::App for LiveGraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_controller(ctx);
        self.handle_screenshot(ctx);
        self.top_bar(ctx);
        self.run_tick(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.plot(ui));
        if !self.window.is_closed() {
            ctx.request_repaint_after(self.tick);
        }
    }
}
