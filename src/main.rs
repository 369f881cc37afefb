mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::DashboardApp;
use eframe::egui;
use state::AppState;
use verification_void::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("Ignoring config: {e:#}");
        DashboardConfig::default()
    });

    let dataset = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.dataset_path.clone());

    let mut state = AppState::new(config);
    if let Some(path) = dataset {
        ui::panels::open_path(&mut state, &path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "The Verification Void",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
