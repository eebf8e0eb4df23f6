//! File output for batch graphs.
//!
//! The output format follows the file extension: `.png` renders a bitmap,
//! `.svg` a vector image and `.html` a self-contained page embedding the SVG
//! with wheel zoom and drag pan.

use std::path::Path;

use egui::{Align, Color32};
use egui_plot::{LineStyle, MarkerShape};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::data::figure::{Figure, LegendEntry};
use crate::data::flightmode::{BAND_ALPHA, BAND_EDGE};
use crate::error::{GraphError, Result};

const FONT: &str = "sans-serif";

/// Render `fig` to `path`, choosing the format by extension.
pub fn save_figure(fig: &mut Figure, path: &Path, size: (u32, u32)) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_figure(fig, &root)?;
            root.present().map_err(plot_err)?;
        }
        Some("svg") => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_figure(fig, &root)?;
            root.present().map_err(plot_err)?;
        }
        Some("html") => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_figure(fig, &root)?;
                root.present().map_err(plot_err)?;
            }
            std::fs::write(path, html_page(&fig.window_title, &svg))?;
        }
        _ => return Err(GraphError::UnsupportedOutput(path.display().to_string())),
    }
    log::info!("saved graph to {}", path.display());
    Ok(())
}

fn plot_err<E: std::fmt::Display>(e: E) -> GraphError {
    GraphError::Export(e.to_string())
}

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

/// Plotters colour for a translucent legend patch. `Color32` stores
/// premultiplied channels, which plotters would otherwise darken twice.
fn patch_fill(c: Color32) -> RGBAColor {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    RGBColor(r, g, b).mix(a as f64 / 255.0)
}

/// Draw the whole figure onto `root`.
pub fn draw_figure<DB>(fig: &mut Figure, root: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let (x0, x1) = padded(fig.x_range);
    let (y0, y1) = fig.rescale((x0, x1));
    let bands = fig.mode_bands((x0, x1));
    let fig = &*fig;
    let (s0, s1) = (
        fig.axis_map.from_primary(y0),
        fig.axis_map.from_primary(y1),
    );

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(if fig.has_secondary() { 60 } else { 0 });
    if let Some(h) = &fig.heading {
        builder.caption(h, (FONT, 22));
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?
        .set_secondary_coord(x0..x1, s0.min(s1)..s0.max(s1));

    let step = (x1 - x0) / 8.0;
    let x_fmt = |x: &f64| fig.x_formatter.format_tick(*x, (x0, x1), step);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(8)
            .y_labels(8)
            .x_label_formatter(&x_fmt)
            .label_style((FONT, 13));
        if !fig.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(plot_err)?;
    }
    if fig.has_secondary() {
        chart
            .configure_secondary_axes()
            .y_labels(8)
            .label_style((FONT, 13))
            .draw()
            .map_err(plot_err)?;
    }

    for b in &bands {
        let area = [(b.x0, y0), (b.x1, y1)];
        chart
            .draw_series(std::iter::once(Rectangle::new(
                area,
                rgb(b.colour).mix(BAND_ALPHA as f64).filled(),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                area,
                rgb(BAND_EDGE).mix(BAND_ALPHA as f64).stroke_width(1),
            )))
            .map_err(plot_err)?;
    }

    for t in &fig.traces {
        let pts: Vec<(f64, f64)> = fig
            .plot_points(t)
            .into_iter()
            .map(|p| (p[0], p[1]))
            .collect();
        let style = rgb(t.look.color).stroke_width(t.look.width.round().max(1.0) as u32);
        match t.look.style {
            Some(LineStyle::Solid) => {
                chart
                    .draw_series(LineSeries::new(pts.iter().copied(), style))
                    .map_err(plot_err)?;
            }
            Some(LineStyle::Dashed { length }) => {
                let len = length.round().max(1.0) as u32;
                chart
                    .draw_series(DashedLineSeries::new(pts.iter().copied(), len, len / 2 + 2, style))
                    .map_err(plot_err)?;
            }
            Some(LineStyle::Dotted { spacing }) => {
                let gap = spacing.round().max(1.0) as u32;
                chart
                    .draw_series(DashedLineSeries::new(pts.iter().copied(), 1, gap, style))
                    .map_err(plot_err)?;
            }
            None => {}
        }
        let size = t.look.point_size.round().max(1.0) as i32;
        match t.look.marker {
            Some(MarkerShape::Circle) | Some(MarkerShape::Square) | Some(MarkerShape::Diamond) => {
                chart
                    .draw_series(pts.iter().map(|p| Circle::new(*p, size, style)))
                    .map_err(plot_err)?;
            }
            Some(MarkerShape::Up) | Some(MarkerShape::Down) => {
                chart
                    .draw_series(pts.iter().map(|p| TriangleMarker::new(*p, size, style)))
                    .map_err(plot_err)?;
            }
            Some(_) => {
                chart
                    .draw_series(pts.iter().map(|p| Cross::new(*p, size, style)))
                    .map_err(plot_err)?;
            }
            None => {}
        }
    }

    let y_mid = (y0 + y1) / 2.0;
    chart
        .draw_series(fig.texts.iter().map(|m| {
            let font = (FONT, 12)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&rgb(m.color).mix(0.6));
            Text::new(m.text.clone(), (m.x, y_mid), font)
        }))
        .map_err(plot_err)?;

    let plot_area = chart.plotting_area();
    let origin = plot_area.get_base_pixel();
    let dim = plot_area.dim_in_pixel();
    for (pos, entries) in fig.legends() {
        draw_legend(root, origin, dim, pos.align(), &entries)?;
    }
    Ok(())
}

/// Data extent with a small margin so end points are not on the frame.
fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = hi - lo;
    if span > 0.0 {
        (lo - span * 0.02, hi + span * 0.02)
    } else {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 1e-3 };
        (lo - pad, hi + pad)
    }
}

const ROW_H: i32 = 18;
const SAMPLE_W: i32 = 24;

fn draw_legend<DB>(
    root: &DrawingArea<DB, Shift>,
    origin: (i32, i32),
    dim: (u32, u32),
    align: egui::Align2,
    entries: &[LegendEntry],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let chars = entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0) as i32;
    let w = SAMPLE_W + 16 + chars * 7;
    let h = entries.len() as i32 * ROW_H + 8;
    let (pw, ph) = (dim.0 as i32, dim.1 as i32);
    let x = origin.0
        + match align.x() {
            Align::Min => 8,
            Align::Center => (pw - w) / 2,
            Align::Max => pw - w - 8,
        };
    let y = origin.1
        + match align.y() {
            Align::Min => 8,
            Align::Center => (ph - h) / 2,
            Align::Max => ph - h - 8,
        };

    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], WHITE.mix(0.8).filled()))
        .map_err(plot_err)?;
    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], BLACK.mix(0.5)))
        .map_err(plot_err)?;
    for (i, e) in entries.iter().enumerate() {
        let cy = y + 4 + i as i32 * ROW_H + ROW_H / 2;
        if e.patch {
            root.draw(&Rectangle::new(
                [(x + 6, cy - 5), (x + 6 + SAMPLE_W, cy + 5)],
                patch_fill(e.color).filled(),
            ))
            .map_err(plot_err)?;
        } else {
            root.draw(&PathElement::new(
                vec![(x + 6, cy), (x + 6 + SAMPLE_W, cy)],
                rgb(e.color).stroke_width(2),
            ))
            .map_err(plot_err)?;
        }
        root.draw(&Text::new(
            e.label.clone(),
            (x + SAMPLE_W + 12, cy - 7),
            (FONT, 13).into_font().color(&BLACK),
        ))
        .map_err(plot_err)?;
    }
    Ok(())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone page: the SVG plus a few lines of script for wheel zoom and
/// drag pan (double-click resets).
fn html_page(title: &str, svg: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ margin: 0; font-family: sans-serif; }}
#graph svg {{ width: 100%; height: auto; cursor: grab; }}
</style>
</head>
<body>
<div id="graph">
{svg}
</div>
<script>
(function () {{
  var svg = document.querySelector('#graph svg');
  if (!svg) return;
  var w = svg.width.baseVal.value, h = svg.height.baseVal.value;
  if (!svg.getAttribute('viewBox')) svg.setAttribute('viewBox', '0 0 ' + w + ' ' + h);
  var home = svg.getAttribute('viewBox');
  function vb() {{ return svg.getAttribute('viewBox').split(/\s+/).map(Number); }}
  svg.addEventListener('wheel', function (ev) {{
    ev.preventDefault();
    var v = vb(), r = svg.getBoundingClientRect();
    var k = ev.deltaY > 0 ? 1.1 : 1 / 1.1;
    var px = v[0] + (ev.clientX - r.left) / r.width * v[2];
    var nw = v[2] * k;
    svg.setAttribute('viewBox', [px - (px - v[0]) * k, v[1], nw, v[3]].join(' '));
  }});
  var drag = null;
  svg.addEventListener('mousedown', function (ev) {{ drag = [ev.clientX, vb()]; }});
  window.addEventListener('mouseup', function () {{ drag = null; }});
  window.addEventListener('mousemove', function (ev) {{
    if (!drag) return;
    var v = drag[1], r = svg.getBoundingClientRect();
    var dx = (ev.clientX - drag[0]) / r.width * v[2];
    svg.setAttribute('viewBox', [v[0] - dx, v[1], v[2], v[3]].join(' '));
  }});
  svg.addEventListener('dblclick', function () {{ svg.setAttribute('viewBox', home); }});
}})();
</script>
</body>
</html>
"#,
        title = html_escape(title),
        svg = svg
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_title_is_escaped() {
        let page = html_page("a<b>", "<svg></svg>");
        assert!(page.contains("<title>a&lt;b&gt;</title>"));
        assert!(page.contains("<svg></svg>"));
    }

    #[test]
    fn mode_legend_patch_matches_band_colour() {
        use crate::data::flightmode::ModeOverlay;

        let c = ModeOverlay::legend_colour(Color32::from_rgb(255, 0, 0));
        let RGBAColor(r, g, b, a) = patch_fill(c);
        assert!(r >= 253, "red channel {r}");
        assert_eq!((g, b), (0, 0));
        assert!((a - c.a() as f64 / 255.0).abs() < 1e-9);

        let c = ModeOverlay::legend_colour(Color32::from_rgb(70, 130, 180));
        let RGBAColor(r, g, b, _) = patch_fill(c);
        assert!(r.abs_diff(70) <= 2 && g.abs_diff(130) <= 2 && b.abs_diff(180) <= 2);
    }

    #[test]
    fn flat_extent_gets_width() {
        let (lo, hi) = padded((5.0, 5.0));
        assert!(lo < 5.0 && hi > 5.0);
    }
}
