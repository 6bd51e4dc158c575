use std::collections::BTreeSet;

use crate::color::CategoryColors;
use crate::data::filter::{FilterState, filtered_indices, init_filter_state};
use crate::data::model::SalesDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The dataset is loaded once at startup and owned here; there is no global
/// cache. Every filter change recomputes `visible_indices`, and the charts
/// derive their tables from that view synchronously.
pub struct AppState {
    /// Loaded dataset. Set once at startup; a failed File → Open… leaves
    /// the previous dataset in place.
    pub dataset: Option<SalesDataset>,

    /// Current country / year-range selection.
    pub filters: FilterState,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Per-country and per-region colours, rebuilt on dataset load.
    pub country_colors: CategoryColors,
    pub region_colors: CategoryColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            filters: FilterState {
                countries: BTreeSet::new(),
                year_range: (0, 0),
            },
            visible_indices: Vec::new(),
            country_colors: CategoryColors::default(),
            region_colors: CategoryColors::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset: default filters, colours, indices.
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.filters = init_filter_state(&dataset);
        self.country_colors = CategoryColors::new(&dataset.countries);
        self.region_colors = CategoryColors::new(&dataset.regions);
        self.visible_indices = filtered_indices(&dataset, &self.filters);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Toggle a single country in the selection.
    pub fn toggle_country(&mut self, country: &str) {
        if !self.filters.countries.remove(country) {
            self.filters.countries.insert(country.to_string());
        }
        self.refilter();
    }

    /// Select every country in the dataset.
    pub fn select_all_countries(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters.countries = ds.countries.iter().cloned().collect();
            self.refilter();
        }
    }

    /// Clear the country selection. The resulting view is empty.
    pub fn select_no_countries(&mut self) {
        self.filters.countries.clear();
        self.refilter();
    }

    /// Set the year range, clamped to the dataset bounds and kept ordered.
    pub fn set_year_range(&mut self, mut min: i32, mut max: i32) {
        if let Some(ds) = &self.dataset {
            min = min.clamp(ds.year_min, ds.year_max);
            max = max.clamp(ds.year_min, ds.year_max);
        }
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        self.filters.year_range = (min, max);
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{SalesDataset, SalesRecord};

    fn record(country: &str, year: i32) -> SalesRecord {
        SalesRecord {
            country: country.to_string(),
            region: "Europe".to_string(),
            year,
            ev_sales: 1.0,
            petrol_car_sales: 1.0,
            diesel_car_sales: 0.0,
            ev_market_share: 0.5,
            ev_growth_rate_yoy: 0.0,
            gdp_per_capita: 0.0,
            charging_stations: 0,
            avg_ev_range_km: 0.0,
            co2_emissions_transport_mt: 0.0,
        }
    }

    fn loaded_state() -> AppState {
        let ds = SalesDataset::from_records(vec![
            record("China", 2020),
            record("Germany", 2021),
            record("Norway", 2022),
        ])
        .unwrap();
        let mut state = AppState::default();
        state.set_dataset(ds);
        state
    }

    #[test]
    fn set_dataset_selects_defaults_and_filters() {
        let state = loaded_state();
        assert_eq!(state.filters.countries.len(), 3);
        assert_eq!(state.filters.year_range, (2020, 2022));
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn toggle_country_updates_visible_indices() {
        let mut state = loaded_state();
        state.toggle_country("Germany");
        assert_eq!(state.visible_indices, vec![0, 2]);
        state.toggle_country("Germany");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn select_none_empties_the_view() {
        let mut state = loaded_state();
        state.select_no_countries();
        assert!(state.visible_indices.is_empty());
        state.select_all_countries();
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn year_range_is_clamped_and_ordered() {
        let mut state = loaded_state();
        state.set_year_range(2025, 1999);
        assert_eq!(state.filters.year_range, (2020, 2022));
        state.set_year_range(2022, 2021);
        assert_eq!(state.filters.year_range, (2021, 2022));
        assert_eq!(state.visible_indices, vec![1, 2]);
    }
}
