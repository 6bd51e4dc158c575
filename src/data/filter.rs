use std::collections::BTreeSet;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Filter predicate: selected countries + inclusive year range
// ---------------------------------------------------------------------------

/// Sidebar filter selection.
///
/// An empty country set means "select none": the view is empty, which is a
/// valid state, not an error. Year bounds are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub countries: BTreeSet<String>,
    pub year_range: (i32, i32),
}

/// How many countries the initial selection picks, matching the dashboard's
/// default of the first five in sorted order.
pub const DEFAULT_COUNTRY_SELECTION: usize = 5;

/// Initialise a [`FilterState`] for a freshly loaded dataset: first five
/// countries in sorted order (all of them if fewer) and the full year range.
pub fn init_filter_state(dataset: &SalesDataset) -> FilterState {
    FilterState {
        countries: dataset
            .countries
            .iter()
            .take(DEFAULT_COUNTRY_SELECTION)
            .cloned()
            .collect(),
        year_range: (dataset.year_min, dataset.year_max),
    }
}

/// Return indices of rows that pass the current filter, in input order.
///
/// A row passes when its country is in the selected set and its year lies
/// within the inclusive range. Pure function of its inputs.
pub fn filtered_indices(dataset: &SalesDataset, filters: &FilterState) -> Vec<usize> {
    let (year_min, year_max) = filters.year_range;
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            rec.year >= year_min && rec.year <= year_max && filters.countries.contains(&rec.country)
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – non-owning subset of the dataset
// ---------------------------------------------------------------------------

/// A borrowed view over the rows passing the current filter.
///
/// `latest_year` is computed once at construction and handed explicitly to
/// the aggregations that slice on it, so they cannot disagree about what
/// "latest" means.
pub struct FilteredView<'a> {
    dataset: &'a SalesDataset,
    indices: &'a [usize],
    latest_year: Option<i32>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a SalesDataset, indices: &'a [usize]) -> Self {
        let latest_year = indices
            .iter()
            .map(|&i| dataset.records[i].year)
            .max();
        FilteredView {
            dataset,
            indices,
            latest_year,
        }
    }

    /// `max(year)` within the view; `None` when the view is empty.
    pub fn latest_year(&self) -> Option<i32> {
        self.latest_year
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::data::model::SalesRecord;

    const COUNTRIES: [&str; 4] = ["China", "Germany", "Norway", "United States"];

    fn record(country: &str, year: i32) -> SalesRecord {
        SalesRecord {
            country: country.to_string(),
            region: "anywhere".to_string(),
            year,
            ev_sales: 1.0,
            petrol_car_sales: 1.0,
            diesel_car_sales: 1.0,
            ev_market_share: 0.1,
            ev_growth_rate_yoy: 0.0,
            gdp_per_capita: 0.0,
            charging_stations: 0,
            avg_ev_range_km: 0.0,
            co2_emissions_transport_mt: 0.0,
        }
    }

    fn dataset(rows: &[(usize, i32)]) -> Option<SalesDataset> {
        SalesDataset::from_records(
            rows.iter()
                .map(|&(c, y)| record(COUNTRIES[c], y))
                .collect(),
        )
    }

    #[test]
    fn full_selection_returns_every_row_in_order() {
        let ds = dataset(&[(2, 2020), (0, 2021), (2, 2015), (1, 2024)]).unwrap();
        let filters = FilterState {
            countries: ds.countries.iter().cloned().collect(),
            year_range: (ds.year_min, ds.year_max),
        };
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_country_selection_yields_empty_view() {
        let ds = dataset(&[(0, 2020), (1, 2021)]).unwrap();
        let filters = FilterState {
            countries: BTreeSet::new(),
            year_range: (ds.year_min, ds.year_max),
        };
        let indices = filtered_indices(&ds, &filters);
        assert!(indices.is_empty());
        let view = FilteredView::new(&ds, &indices);
        assert!(view.is_empty());
        assert_eq!(view.latest_year(), None);
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let ds = dataset(&[(0, 2019), (0, 2020), (0, 2021), (0, 2022)]).unwrap();
        let filters = FilterState {
            countries: ds.countries.iter().cloned().collect(),
            year_range: (2020, 2021),
        };
        assert_eq!(filtered_indices(&ds, &filters), vec![1, 2]);
    }

    #[test]
    fn default_selection_takes_first_five_sorted_countries() {
        let ds = dataset(&[(3, 2020), (2, 2020), (1, 2020), (0, 2020)]).unwrap();
        let filters = init_filter_state(&ds);
        // Fewer than five countries: all selected.
        assert_eq!(filters.countries.len(), 4);
        assert_eq!(filters.year_range, (2020, 2020));
    }

    #[test]
    fn latest_year_is_computed_over_the_view_not_the_dataset() {
        let ds = dataset(&[(0, 2024), (1, 2020), (1, 2021)]).unwrap();
        let filters = FilterState {
            countries: [COUNTRIES[1].to_string()].into_iter().collect(),
            year_range: (ds.year_min, ds.year_max),
        };
        let indices = filtered_indices(&ds, &filters);
        let view = FilteredView::new(&ds, &indices);
        assert_eq!(view.latest_year(), Some(2021));
    }

    proptest! {
        #[test]
        fn filter_output_is_an_ordered_subset_matching_both_predicates(
            rows in prop::collection::vec((0usize..4, 2015i32..2025), 1..40),
            selection in prop::collection::btree_set(0usize..4, 0..4),
            a in 2015i32..2025,
            b in 2015i32..2025,
        ) {
            let ds = dataset(&rows).unwrap();
            let filters = FilterState {
                countries: selection.iter().map(|&c| COUNTRIES[c].to_string()).collect(),
                year_range: (a.min(b), a.max(b)),
            };
            let indices = filtered_indices(&ds, &filters);

            // Strictly increasing indices: output preserves input order.
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));

            // Every selected row satisfies both predicates…
            for &i in &indices {
                let rec = &ds.records[i];
                prop_assert!(filters.countries.contains(&rec.country));
                prop_assert!(rec.year >= filters.year_range.0 && rec.year <= filters.year_range.1);
            }

            // …and every qualifying row is selected.
            let expected = ds
                .records
                .iter()
                .enumerate()
                .filter(|(_, r)| {
                    filters.countries.contains(&r.country)
                        && r.year >= filters.year_range.0
                        && r.year <= filters.year_range.1
                })
                .count();
            prop_assert_eq!(indices.len(), expected);
        }
    }
}
