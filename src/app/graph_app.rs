//! Interactive window for a batch graph.
//!
//! [`GraphApp`] draws a prepared [`Figure`] with egui_plot: flight-mode bands
//! behind the traces, an optional right-hand axis for secondary fields, legend
//! boxes in the configured corners and a cursor readout in the status bar.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Stroke, StrokeKind, Vec2};
use egui_plot::{
    AxisHints, GridInput, GridMark, HPlacement, Line, Plot, PlotPoint, Points, Polygon, Text,
};
use image::{Rgba, RgbaImage};

use crate::controllers::XRangeLink;
use crate::data::figure::{Figure, LegendEntry};
use crate::data::flightmode::{ModeOverlay, BAND_EDGE};
use crate::data::x_formatter::time_grid_marks;
use crate::export;

const LINK_POLL: Duration = Duration::from_millis(100);

// ─────────────────────────────────────────────────────────────────────────────
// GraphApp
// ─────────────────────────────────────────────────────────────────────────────

pub struct GraphApp {
    fig: Figure,
    view_x: (f64, f64),
    view_y: (f64, f64),
    /// Push `view_x`/`view_y` into the plot on the next frame.
    apply_view: bool,
    link: Option<XRangeLink>,
    last_poll: Instant,
    drawn: bool,
    cursor: Option<String>,
    export_size: (u32, u32),
    pending_screenshot: Option<PathBuf>,
    status: Option<String>,
}

impl GraphApp {
    pub fn new(mut fig: Figure, link: Option<XRangeLink>, export_size: (u32, u32)) -> Self {
        let view_x = fig.x_range;
        let view_y = fig.rescale(view_x);
        Self {
            fig,
            view_x,
            view_y,
            apply_view: true,
            link,
            last_poll: Instant::now(),
            drawn: false,
            cursor: None,
            export_size,
            pending_screenshot: None,
            status: None,
        }
    }

    pub fn figure(&self) -> &Figure {
        &self.fig
    }

    /// Fit y to the data inside the visible x range.
    pub fn rescale_y(&mut self) {
        self.view_y = self.fig.rescale(self.view_x);
        self.apply_view = true;
    }

    pub fn reset_view(&mut self) {
        self.view_x = self.fig.x_range;
        self.rescale_y();
    }

    fn poll_link(&mut self) {
        if self.last_poll.elapsed() < LINK_POLL {
            return;
        }
        self.last_poll = Instant::now();
        if let Some(range) = self.link.as_mut().and_then(|l| l.poll()) {
            log::debug!("linked x range {:?}", range);
            self.view_x = range;
            self.apply_view = true;
        }
    }

    fn save_dialog(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.fig.default_filename)
            .add_filter("PNG", &["png"])
            .add_filter("SVG", &["svg"])
            .add_filter("HTML", &["html"])
            .save_file()
        else {
            return;
        };
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(true);
        if is_png {
            self.pending_screenshot = Some(path);
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
        } else {
            let result = export::save_figure(&mut self.fig, &path, self.export_size);
            self.status = Some(match result {
                Ok(()) => format!("Saved {}", path.display()),
                Err(e) => {
                    log::error!("{e}");
                    e.to_string()
                }
            });
            // the exporter fits y to the full range; restore the window's fit
            self.view_y = self.fig.rescale(self.view_x);
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
        self.status = Some(match out.save(&path) {
            Ok(()) => {
                log::info!("saved screenshot to {}", path.display());
                format!("Saved {}", path.display())
            }
            Err(e) => {
                log::error!("failed to save screenshot: {e}");
                format!("Save failed: {e}")
            }
        });
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("graph_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(h) = &self.fig.heading {
                    ui.label(RichText::new(h).strong());
                    ui.separator();
                }
                if ui.button("Rescale Y").clicked() {
                    self.rescale_y();
                }
                if ui.button("Reset view").clicked() {
                    self.reset_view();
                }
                if ui
                    .button("Save image")
                    .on_hover_text("Save as PNG (window), SVG or HTML")
                    .clicked()
                {
                    self.save_dialog(ctx);
                }
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("graph_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.monospace(self.cursor.as_deref().unwrap_or(""));
                if let Some(s) = &self.status {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(s);
                    });
                }
            });
        });
    }

    fn plot(&mut self, ui: &mut egui::Ui) {
        let bands = self.fig.mode_bands(self.view_x);
        let fig = &self.fig;

        let fmt = fig.x_formatter.clone();
        let mut plot = Plot::new("graph_plot")
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_boxed_zoom(true)
            .show_grid(fig.grid)
            .x_axis_formatter(move |x, range| {
                fmt.format_tick(x.value, (*range.start(), *range.end()), x.step_size)
            });
        if fig.x_formatter.is_time() {
            plot = plot.x_grid_spacer(|input: GridInput| {
                time_grid_marks(input.bounds, input.base_step_size)
                    .into_iter()
                    .map(|(value, step_size)| GridMark { value, step_size })
                    .collect()
            });
        }
        if fig.has_secondary() {
            let map = fig.axis_map;
            plot = plot.custom_y_axes(vec![
                AxisHints::new_y(),
                AxisHints::new_y()
                    .placement(HPlacement::Right)
                    .formatter(move |y, _range| format_axis(map.from_primary(y.value))),
            ]);
        }

        let apply_view = std::mem::take(&mut self.apply_view);
        let (vx, vy) = (self.view_x, self.view_y);
        let plot_resp = plot.show(ui, |plot_ui| {
            if apply_view {
                plot_ui.set_plot_bounds_x(vx.0..=vx.1);
                plot_ui.set_plot_bounds_y(vy.0..=vy.1);
            }
            let b = plot_ui.plot_bounds();
            let (y0, y1) = (b.min()[1], b.max()[1]);

            for band in &bands {
                let poly = vec![[band.x0, y0], [band.x1, y0], [band.x1, y1], [band.x0, y1]];
                plot_ui.polygon(
                    Polygon::new(&band.mode, poly)
                        .fill_color(ModeOverlay::band_fill(band.colour))
                        .stroke(Stroke::new(1.0, ModeOverlay::band_fill(BAND_EDGE)))
                        .allow_hover(false),
                );
            }

            for t in &fig.traces {
                let pts = fig.plot_points(t);
                if t.look.show_line() {
                    if let Some(style) = t.look.style {
                        plot_ui.line(
                            Line::new(&t.label, pts.clone())
                                .color(t.look.color)
                                .width(t.look.width)
                                .style(style),
                        );
                    }
                }
                if t.look.show_points() {
                    if let Some(shape) = t.look.marker {
                        plot_ui.points(
                            Points::new(&t.label, pts)
                                .radius(t.look.point_size)
                                .shape(shape)
                                .color(t.look.color),
                        );
                    }
                }
            }

            let y_mid = (y0 + y1) / 2.0;
            for m in &fig.texts {
                let c = m.color.gamma_multiply(0.6);
                plot_ui.text(Text::new(
                    &m.text,
                    PlotPoint::new(m.x, y_mid),
                    RichText::new(&m.text).color(c),
                ));
            }

            plot_ui.pointer_coordinate()
        });

        let b = plot_resp.transform.bounds();
        let (x0, x1) = (b.min()[0], b.max()[0]);
        if x0.is_finite() && x1.is_finite() && x1 > x0 {
            self.view_x = (x0, x1);
            self.view_y = (b.min()[1], b.max()[1]);
        }
        self.cursor = plot_resp
            .inner
            .map(|p| self.fig.cursor_text(p.x, p.y));

        let frame = plot_resp.transform.frame();
        let painter = ui.painter_at(*frame);
        for (pos, entries) in self.fig.legends() {
            paint_legend(&painter, frame.shrink(8.0), pos.align(), &entries);
        }

        if self.drawn {
            if let Some(link) = self.link.as_mut() {
                link.publish(self.view_x);
            }
        }
        self.drawn = true;
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_link();
        self.handle_screenshot(ctx);
        self.top_bar(ctx);
        self.status_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.plot(ui));
        if self.link.is_some() {
            ctx.request_repaint_after(LINK_POLL);
        }
    }
}

fn format_axis(v: f64) -> String {
    let s = format!("{v:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

const ROW_H: f32 = 18.0;
const SAMPLE_W: f32 = 24.0;

fn paint_legend(painter: &egui::Painter, area: Rect, align: Align2, entries: &[LegendEntry]) {
    let font = FontId::proportional(13.0);
    let galleys: Vec<_> = entries
        .iter()
        .map(|e| painter.layout_no_wrap(e.label.clone(), font.clone(), Color32::BLACK))
        .collect();
    let text_w = galleys.iter().map(|g| g.size().x).fold(0.0, f32::max);
    let size = Vec2::new(SAMPLE_W + 18.0 + text_w, entries.len() as f32 * ROW_H + 8.0);
    let rect = align.align_size_within_rect(size, area);

    painter.rect_filled(rect, 3.0, Color32::from_white_alpha(210));
    painter.rect_stroke(
        rect,
        3.0,
        Stroke::new(1.0, Color32::from_gray(128)),
        StrokeKind::Inside,
    );
    for (i, (e, galley)) in entries.iter().zip(galleys).enumerate() {
        let cy = rect.top() + 4.0 + i as f32 * ROW_H + ROW_H / 2.0;
        let x = rect.left() + 6.0;
        if e.patch {
            let r = Rect::from_min_max(Pos2::new(x, cy - 5.0), Pos2::new(x + SAMPLE_W, cy + 5.0));
            painter.rect_filled(r, 0.0, e.color);
        } else {
            painter.line_segment(
                [Pos2::new(x, cy), Pos2::new(x + SAMPLE_W, cy)],
                Stroke::new(2.0, e.color),
            );
        }
        let pos = Pos2::new(x + SAMPLE_W + 6.0, cy - galley.size().y / 2.0);
        painter.galley(pos, galley, Color32::BLACK);
    }
}
