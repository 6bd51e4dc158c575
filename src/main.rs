mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::EvDashApp;
use eframe::egui;

/// Relative path of the dataset loaded at startup.
const DEFAULT_DATASET_PATH: &str = "ev_vs_petrol_dataset_v3.csv";

fn main() -> eframe::Result {
    env_logger::init();

    // The startup load is fatal: without a dataset there is nothing to show.
    // Files opened later through the UI fail softly instead.
    let dataset = match data::loader::load_file(Path::new(DEFAULT_DATASET_PATH)) {
        Ok(ds) => ds,
        Err(e) => {
            log::error!("failed to load {DEFAULT_DATASET_PATH}: {e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "Loaded {} rows, {} countries, years {}..{}",
        dataset.len(),
        dataset.countries.len(),
        dataset.year_min,
        dataset.year_max
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EV Dash – EV vs Petrol Sales Analytics",
        options,
        Box::new(|_cc| Ok(Box::new(EvDashApp::with_dataset(dataset)))),
    )
}
