use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let countries = dataset.countries.clone();
    let (year_min, year_max) = (dataset.year_min, dataset.year_max);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Country selection ----
            let n_selected = state.filters.countries.len();
            let header_text = format!("Countries  ({n_selected}/{})", countries.len());

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("country_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_countries();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_countries();
                        }
                    });

                    for country in &countries {
                        let mut checked = state.filters.countries.contains(country);
                        let text = RichText::new(country)
                            .color(state.country_colors.color_for(country));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_country(country);
                        }
                    }
                });

            ui.separator();

            // ---- Year range (inclusive on both ends) ----
            ui.strong("Year range");
            let (mut from, mut to) = state.filters.year_range;
            let from_changed = ui
                .add(egui::Slider::new(&mut from, year_min..=year_max).text("from"))
                .changed();
            let to_changed = ui
                .add(egui::Slider::new(&mut to, year_min..=year_max).text("to"))
                .changed();
            if from_changed || to_changed {
                state.set_year_range(from, to);
            }

            ui.separator();
            ui.label(format!("Data points: {}", state.visible_indices.len()));
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows across {} countries",
                    dataset.len(),
                    dataset.countries.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                // Keep the current dataset; a bad pick is not fatal.
                log::error!("Failed to load file: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
