use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SalesRecord – one row of the source dataset
// ---------------------------------------------------------------------------

/// One (country, year) observation of the EV vs petrol sales dataset.
///
/// Field names match the source file's header row exactly, so the struct
/// deserializes straight out of CSV and JSON records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub country: String,
    pub region: String,
    pub year: i32,
    pub ev_sales: f64,
    pub petrol_car_sales: f64,
    pub diesel_car_sales: f64,
    /// Fraction in 0–1, not a percentage.
    pub ev_market_share: f64,
    /// Year-over-year growth in percent; negative values are real.
    pub ev_growth_rate_yoy: f64,
    pub gdp_per_capita: f64,
    pub charging_stations: i64,
    pub avg_ev_range_km: f64,
    pub co2_emissions_transport_mt: f64,
}

/// Column names of the source schema, in file order. The loader rejects
/// files missing any of these.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "country",
    "region",
    "year",
    "ev_sales",
    "petrol_car_sales",
    "diesel_car_sales",
    "ev_market_share",
    "ev_growth_rate_yoy",
    "gdp_per_capita",
    "charging_stations",
    "avg_ev_range_km",
    "co2_emissions_transport_mt",
];

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed value indices.
///
/// Immutable after construction: the app loads it once and every view or
/// derived table borrows from it.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    /// All rows, in file order.
    pub records: Vec<SalesRecord>,
    /// Sorted unique country names.
    pub countries: Vec<String>,
    /// Sorted unique region names.
    pub regions: Vec<String>,
    /// Inclusive year bounds over the whole dataset.
    pub year_min: i32,
    pub year_max: i32,
}

impl SalesDataset {
    /// Build value indices from the loaded rows.
    ///
    /// Returns `None` for an empty row list: year bounds would be undefined,
    /// and the loader treats that case as a malformed file.
    pub fn from_records(records: Vec<SalesRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let mut country_set: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        let mut region_set: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        let mut year_min = i32::MAX;
        let mut year_max = i32::MIN;

        for rec in &records {
            country_set.insert(rec.country.clone());
            region_set.insert(rec.region.clone());
            year_min = year_min.min(rec.year);
            year_max = year_max.max(rec.year);
        }

        Some(SalesDataset {
            records,
            countries: country_set.into_iter().collect(),
            regions: region_set.into_iter().collect(),
            year_min,
            year_max,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
