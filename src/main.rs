mod anim;
mod app;
mod color;
mod config;
mod data;
mod headless;
mod layers;
mod state;
mod ui;

use anyhow::anyhow;
use app::FloatWatchApp;
use clap::Parser;
use config::{Cli, DashboardConfig};
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::try_from(Cli::parse())?;
    if let Some(options) = config.headless.clone() {
        return headless::run(&config, &options);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Floatwatch – Ocean Floater Tracking",
        options,
        Box::new(|_cc| Ok(Box::new(FloatWatchApp::new(config)))),
    )
    .map_err(|e| anyhow!("running the dashboard: {e}"))
}
