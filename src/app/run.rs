//! Entry points that open graph windows.
//!
//! Both calls block until the window is closed.

use eframe::egui;

use crate::config::{GraphConfig, LiveGraphConfig};
use crate::data::figure::Figure;
use crate::error::Result;
use crate::sink::LiveReceiver;

use super::graph_app::GraphApp;
use super::live_app::LiveGraphApp;

/// Show `fig` in an interactive window.
pub fn run_graph(fig: Figure, mut cfg: GraphConfig) -> Result<()> {
    let title = fig.window_title.clone();
    let opts = native_options(cfg.native_options.take(), egui::vec2(1200.0, 800.0));
    let app = GraphApp::new(fig, cfg.xrange_link.take(), cfg.output_size);
    log::debug!("opening graph window '{title}'");
    eframe::run_native(&title, opts, Box::new(|cc| {
        install_fonts(&cc.egui_ctx);
        Ok(Box::new(app))
    }))?;
    Ok(())
}

/// Show a live graph fed by `rx`.
pub fn run_live(mut cfg: LiveGraphConfig, rx: LiveReceiver) -> Result<()> {
    cfg.validate()?;
    let title = cfg.title.clone();
    let opts = native_options(cfg.native_options.take(), egui::vec2(900.0, 500.0));
    let app = LiveGraphApp::new(&mut cfg, rx);
    eframe::run_native(&title, opts, Box::new(|cc| {
        install_fonts(&cc.egui_ctx);
        Ok(Box::new(app))
    }))?;
    Ok(())
}

fn native_options(opts: Option<eframe::NativeOptions>, size: egui::Vec2) -> eframe::NativeOptions {
    let mut opts = opts.unwrap_or_default();
    // Set a default window size if one is not provided by config.
    if opts.viewport.inner_size.is_none() {
        opts.viewport = opts.viewport.clone().with_inner_size(size);
    }
    opts
}

fn install_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
}
