mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::MallInsightsApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = match DashboardConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}; falling back to default settings");
            DashboardConfig::default()
        }
    };
    // A dataset given on the command line wins over the config file.
    if let Some(path) = std::env::args_os().nth(1) {
        config.data_path = Some(PathBuf::from(path));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Mall Insights – Audience & Category Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(MallInsightsApp::new(config)))),
    )
}
