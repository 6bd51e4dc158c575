use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::filter::FilteredView;
use crate::data::model::{REQUIRED_COLUMNS, SalesRecord};

// ---------------------------------------------------------------------------
// Raw data table (collapsible section under the charts)
// ---------------------------------------------------------------------------

/// Render the current view as a table, sorted by year descending.
pub fn raw_data_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let mut rows: Vec<&SalesRecord> = view.iter().collect();
    // Stable sort keeps the file order within a year.
    rows.sort_by_key(|r| std::cmp::Reverse(r.year));

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().resizable(true), REQUIRED_COLUMNS.len())
        .header(20.0, |mut header| {
            for name in REQUIRED_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let rec = rows[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.country);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.region);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.year.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.ev_sales));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.petrol_car_sales));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.diesel_car_sales));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.4}", rec.ev_market_share));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.1}", rec.ev_growth_rate_yoy));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.gdp_per_capita));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.charging_stations.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.avg_ev_range_km));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.2}", rec.co2_emissions_transport_mt));
                });
            });
        });
}
