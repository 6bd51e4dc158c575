use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::filter::FilteredView;
use super::model::SalesRecord;

// ---------------------------------------------------------------------------
// NoDataError
// ---------------------------------------------------------------------------

/// Raised by every aggregation handed an empty view. Reductions over empty
/// numeric sets are undefined, so nothing here silently returns zero; the
/// UI maps this to a per-chart empty-state label.
#[derive(Debug, Error)]
#[error("no rows match the current selection")]
pub struct NoDataError;

/// The market-share ranking keeps this many countries.
pub const SHARE_RANKING_SIZE: usize = 15;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Chart 1: EV vs petrol sales over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearlySales {
    pub year: i32,
    pub ev_sales: f64,
    pub petrol_sales: f64,
}

/// Per-year sums of EV and petrol sales, ascending by year. Years with no
/// rows in the view are omitted.
pub fn sales_over_time(view: &FilteredView<'_>) -> Result<Vec<YearlySales>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut by_year: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = by_year.entry(rec.year).or_insert((0.0, 0.0));
        entry.0 += rec.ev_sales;
        entry.1 += rec.petrol_car_sales;
    }
    Ok(by_year
        .into_iter()
        .map(|(year, (ev_sales, petrol_sales))| YearlySales {
            year,
            ev_sales,
            petrol_sales,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Chart 2: EV market share ranking by country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CountryShare {
    pub country: String,
    /// Percentage in [0, 100], rounded to two decimals.
    pub ev_share: f64,
}

/// EV share of each country's total sales, top [`SHARE_RANKING_SIZE`]
/// descending. Countries whose summed total is zero are excluded rather
/// than reported as 0%: the ratio is undefined there. Ties keep the
/// pre-sort (alphabetical group) order.
pub fn market_share_by_country(view: &FilteredView<'_>) -> Result<Vec<CountryShare>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut totals: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = totals.entry(rec.country.as_str()).or_insert((0.0, 0.0, 0.0));
        entry.0 += rec.ev_sales;
        entry.1 += rec.petrol_car_sales;
        entry.2 += rec.diesel_car_sales;
    }

    let mut ranking: Vec<CountryShare> = totals
        .into_iter()
        .filter_map(|(country, (ev, petrol, diesel))| {
            let total = ev + petrol + diesel;
            if total <= 0.0 {
                return None;
            }
            Some(CountryShare {
                country: country.to_string(),
                ev_share: round2(ev / total * 100.0),
            })
        })
        .collect();

    // sort_by is stable, so equal shares stay in alphabetical order.
    ranking.sort_by(|a, b| b.ev_share.total_cmp(&a.ev_share));
    ranking.truncate(SHARE_RANKING_SIZE);
    Ok(ranking)
}

// ---------------------------------------------------------------------------
// Chart 3: vehicle-type distribution in the latest year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDistribution {
    pub ev: f64,
    pub petrol: f64,
    pub diesel: f64,
}

impl VehicleDistribution {
    pub fn total(&self) -> f64 {
        self.ev + self.petrol + self.diesel
    }
}

/// Sales sums per vehicle type over the rows of `latest_year` only.
pub fn vehicle_type_distribution(
    view: &FilteredView<'_>,
    latest_year: i32,
) -> Result<VehicleDistribution, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut dist = VehicleDistribution {
        ev: 0.0,
        petrol: 0.0,
        diesel: 0.0,
    };
    for rec in view.iter().filter(|r| r.year == latest_year) {
        dist.ev += rec.ev_sales;
        dist.petrol += rec.petrol_car_sales;
        dist.diesel += rec.diesel_car_sales;
    }
    Ok(dist)
}

// ---------------------------------------------------------------------------
// Chart 4: regional EV sales trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalTrendPoint {
    pub year: i32,
    pub region: String,
    pub ev_sales: f64,
}

/// EV sales summed per (year, region), ascending by (year, region).
pub fn regional_sales_trend(
    view: &FilteredView<'_>,
) -> Result<Vec<RegionalTrendPoint>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut by_key: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for rec in view.iter() {
        *by_key.entry((rec.year, rec.region.as_str())).or_insert(0.0) += rec.ev_sales;
    }
    Ok(by_key
        .into_iter()
        .map(|((year, region), ev_sales)| RegionalTrendPoint {
            year,
            region: region.to_string(),
            ev_sales,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Chart 5: growth-rate scatter (row-level pass-through)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub year: i32,
    pub growth_rate: f64,
    pub country: String,
}

pub fn growth_rate_points(view: &FilteredView<'_>) -> Result<Vec<GrowthPoint>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    Ok(view
        .iter()
        .map(|rec| GrowthPoint {
            year: rec.year,
            growth_rate: rec.ev_growth_rate_yoy,
            country: rec.country.clone(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Chart 6: GDP per capita vs EV market share (latest year)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GdpSharePoint {
    pub country: String,
    pub region: String,
    pub gdp_per_capita: f64,
    /// Percentage, `ev_market_share` × 100.
    pub ev_share_pct: f64,
    pub charging_stations: i64,
}

/// Latest-year rows, one per country. Duplicate country rows beyond the
/// first occurrence are dropped, not merged.
pub fn gdp_vs_share(
    view: &FilteredView<'_>,
    latest_year: i32,
) -> Result<Vec<GdpSharePoint>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut points = Vec::new();
    for rec in view.iter().filter(|r| r.year == latest_year) {
        if !seen.insert(rec.country.as_str()) {
            continue;
        }
        points.push(GdpSharePoint {
            country: rec.country.clone(),
            region: rec.region.clone(),
            gdp_per_capita: rec.gdp_per_capita,
            ev_share_pct: rec.ev_market_share * 100.0,
            charging_stations: rec.charging_stations,
        });
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Charts 7 & 8: per-year means (emissions, charging stations)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearlyMean {
    pub year: i32,
    pub value: f64,
}

fn yearly_mean(
    view: &FilteredView<'_>,
    value: impl Fn(&SalesRecord) -> f64,
) -> Result<Vec<YearlyMean>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = by_year.entry(rec.year).or_insert((0.0, 0));
        entry.0 += value(rec);
        entry.1 += 1;
    }
    Ok(by_year
        .into_iter()
        .map(|(year, (sum, n))| YearlyMean {
            year,
            value: sum / n as f64,
        })
        .collect())
}

/// Mean transport CO₂ emissions per year.
pub fn emissions_trend(view: &FilteredView<'_>) -> Result<Vec<YearlyMean>, NoDataError> {
    yearly_mean(view, |rec| rec.co2_emissions_transport_mt)
}

/// Mean charging-station count per year.
pub fn charging_trend(view: &FilteredView<'_>) -> Result<Vec<YearlyMean>, NoDataError> {
    yearly_mean(view, |rec| rec.charging_stations as f64)
}

// ---------------------------------------------------------------------------
// Chart 9: EV range distribution by region (latest year, box plot)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBox {
    pub region: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Five-number summary of `avg_ev_range_km` per region, latest year only.
/// Regions with no latest-year rows are omitted.
pub fn range_distribution(
    view: &FilteredView<'_>,
    latest_year: i32,
) -> Result<Vec<RangeBox>, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut by_region: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for rec in view.iter().filter(|r| r.year == latest_year) {
        by_region
            .entry(rec.region.as_str())
            .or_default()
            .push(rec.avg_ev_range_km);
    }
    Ok(by_region
        .into_iter()
        .map(|(region, mut values)| {
            values.sort_by(f64::total_cmp);
            RangeBox {
                region: region.to_string(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            }
        })
        .collect())
}

/// Linear-interpolation quantile over a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

// ---------------------------------------------------------------------------
// Chart 10: country × year market-share heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ShareHeatmap {
    /// Row labels, sorted.
    pub countries: Vec<String>,
    /// Column labels, ascending.
    pub years: Vec<i32>,
    /// `cells[country][year]`: mean EV market share as a percentage.
    /// `None` marks a (country, year) pair with no rows; it renders blank,
    /// never as zero.
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn market_share_heatmap(view: &FilteredView<'_>) -> Result<ShareHeatmap, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut sums: BTreeMap<(&str, i32), (f64, usize)> = BTreeMap::new();
    let mut countries: BTreeSet<&str> = BTreeSet::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();
    for rec in view.iter() {
        countries.insert(rec.country.as_str());
        years.insert(rec.year);
        let entry = sums.entry((rec.country.as_str(), rec.year)).or_insert((0.0, 0));
        entry.0 += rec.ev_market_share;
        entry.1 += 1;
    }

    let countries: Vec<&str> = countries.into_iter().collect();
    let years: Vec<i32> = years.into_iter().collect();
    let cells = countries
        .iter()
        .map(|&country| {
            years
                .iter()
                .map(|&year| {
                    sums.get(&(country, year))
                        .map(|&(sum, n)| sum / n as f64 * 100.0)
                })
                .collect()
        })
        .collect();

    Ok(ShareHeatmap {
        countries: countries.into_iter().map(str::to_string).collect(),
        years,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_ev_sales: f64,
    pub total_petrol_sales: f64,
    /// Mean of `ev_market_share` × 100.
    pub mean_ev_share_pct: f64,
    pub max_charging_stations: i64,
}

pub fn summary(view: &FilteredView<'_>) -> Result<Summary, NoDataError> {
    if view.is_empty() {
        return Err(NoDataError);
    }
    let mut total_ev = 0.0;
    let mut total_petrol = 0.0;
    let mut share_sum = 0.0;
    let mut max_charging = i64::MIN;
    for rec in view.iter() {
        total_ev += rec.ev_sales;
        total_petrol += rec.petrol_car_sales;
        share_sum += rec.ev_market_share;
        max_charging = max_charging.max(rec.charging_stations);
    }
    Ok(Summary {
        total_ev_sales: total_ev,
        total_petrol_sales: total_petrol,
        mean_ev_share_pct: share_sum / view.len() as f64 * 100.0,
        max_charging_stations: max_charging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilteredView;
    use crate::data::model::{SalesDataset, SalesRecord};

    fn rec(country: &str, year: i32) -> SalesRecord {
        SalesRecord {
            country: country.to_string(),
            region: "Europe".to_string(),
            year,
            ev_sales: 0.0,
            petrol_car_sales: 0.0,
            diesel_car_sales: 0.0,
            ev_market_share: 0.0,
            ev_growth_rate_yoy: 0.0,
            gdp_per_capita: 0.0,
            charging_stations: 0,
            avg_ev_range_km: 0.0,
            co2_emissions_transport_mt: 0.0,
        }
    }

    fn sales(country: &str, year: i32, ev: f64, petrol: f64, diesel: f64) -> SalesRecord {
        let mut r = rec(country, year);
        r.ev_sales = ev;
        r.petrol_car_sales = petrol;
        r.diesel_car_sales = diesel;
        r
    }

    /// Dataset + all-rows index vector, for building full views.
    fn fixture(records: Vec<SalesRecord>) -> (SalesDataset, Vec<usize>) {
        let ds = SalesDataset::from_records(records).expect("non-empty fixture");
        let indices = (0..ds.len()).collect();
        (ds, indices)
    }

    #[test]
    fn sales_over_time_sums_per_year() {
        let (ds, idx) = fixture(vec![
            sales("US", 2020, 100.0, 900.0, 0.0),
            sales("US", 2021, 300.0, 700.0, 0.0),
        ]);
        let view = FilteredView::new(&ds, &idx);
        let table = sales_over_time(&view).expect("agg");
        assert_eq!(
            table,
            vec![
                YearlySales {
                    year: 2020,
                    ev_sales: 100.0,
                    petrol_sales: 900.0
                },
                YearlySales {
                    year: 2021,
                    ev_sales: 300.0,
                    petrol_sales: 700.0
                },
            ]
        );
    }

    #[test]
    fn market_share_example_rounds_to_two_decimals() {
        let (ds, idx) = fixture(vec![sales("US", 2020, 100.0, 900.0, 0.0)]);
        let view = FilteredView::new(&ds, &idx);
        let ranking = market_share_by_country(&view).expect("agg");
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].country, "US");
        assert!((ranking[0].ev_share - 10.0).abs() <= 1e-12);
    }

    #[test]
    fn market_share_ranking_is_descending_capped_and_in_range() {
        let records = (0..18)
            .map(|i| {
                // 18 countries with distinct shares between ~5% and ~90%.
                let ev = (i + 1) as f64 * 5.0;
                sales(&format!("country-{i:02}"), 2020, ev, 100.0 - ev, 0.0)
            })
            .collect();
        let (ds, idx) = fixture(records);
        let view = FilteredView::new(&ds, &idx);
        let ranking = market_share_by_country(&view).expect("agg");

        assert_eq!(ranking.len(), SHARE_RANKING_SIZE);
        for pair in ranking.windows(2) {
            assert!(pair[0].ev_share >= pair[1].ev_share);
        }
        for entry in &ranking {
            assert!(entry.ev_share >= 0.0 && entry.ev_share <= 100.0);
        }
        // Highest share first.
        assert_eq!(ranking[0].country, "country-17");
    }

    #[test]
    fn market_share_ties_keep_alphabetical_order() {
        let (ds, idx) = fixture(vec![
            sales("Uruguay", 2020, 10.0, 90.0, 0.0),
            sales("Austria", 2020, 10.0, 90.0, 0.0),
        ]);
        let view = FilteredView::new(&ds, &idx);
        let ranking = market_share_by_country(&view).expect("agg");
        assert_eq!(ranking[0].country, "Austria");
        assert_eq!(ranking[1].country, "Uruguay");
    }

    #[test]
    fn market_share_excludes_zero_total_countries() {
        let (ds, idx) = fixture(vec![
            sales("Nowhere", 2020, 0.0, 0.0, 0.0),
            sales("US", 2020, 50.0, 50.0, 0.0),
        ]);
        let view = FilteredView::new(&ds, &idx);
        let ranking = market_share_by_country(&view).expect("agg");
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].country, "US");
    }

    #[test]
    fn vehicle_distribution_only_counts_the_latest_year() {
        let (ds, idx) = fixture(vec![
            sales("US", 2020, 100.0, 900.0, 50.0),
            sales("US", 2021, 300.0, 700.0, 25.0),
            sales("DE", 2021, 200.0, 100.0, 75.0),
        ]);
        let view = FilteredView::new(&ds, &idx);
        let latest = view.latest_year().expect("latest year");
        assert_eq!(latest, 2021);

        let dist = vehicle_type_distribution(&view, latest).expect("agg");
        assert_eq!(
            dist,
            VehicleDistribution {
                ev: 500.0,
                petrol: 800.0,
                diesel: 100.0
            }
        );
        assert!((dist.total() - 1400.0).abs() <= 1e-12);
    }

    #[test]
    fn regional_trend_groups_by_year_then_region() {
        let mut a = sales("NO", 2020, 10.0, 0.0, 0.0);
        a.region = "Europe".to_string();
        let mut b = sales("CN", 2020, 20.0, 0.0, 0.0);
        b.region = "Asia".to_string();
        let mut c = sales("SE", 2020, 5.0, 0.0, 0.0);
        c.region = "Europe".to_string();
        let mut d = sales("CN", 2021, 40.0, 0.0, 0.0);
        d.region = "Asia".to_string();

        let (ds, idx) = fixture(vec![a, b, c, d]);
        let view = FilteredView::new(&ds, &idx);
        let trend = regional_sales_trend(&view).expect("agg");
        assert_eq!(
            trend,
            vec![
                RegionalTrendPoint {
                    year: 2020,
                    region: "Asia".to_string(),
                    ev_sales: 20.0
                },
                RegionalTrendPoint {
                    year: 2020,
                    region: "Europe".to_string(),
                    ev_sales: 15.0
                },
                RegionalTrendPoint {
                    year: 2021,
                    region: "Asia".to_string(),
                    ev_sales: 40.0
                },
            ]
        );
    }

    #[test]
    fn growth_points_pass_rows_through_in_order() {
        let mut a = rec("US", 2020);
        a.ev_growth_rate_yoy = 12.0;
        let mut b = rec("DE", 2021);
        b.ev_growth_rate_yoy = -3.5;
        let (ds, idx) = fixture(vec![a, b]);
        let view = FilteredView::new(&ds, &idx);
        let points = growth_rate_points(&view).expect("agg");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].country, "US");
        assert!((points[1].growth_rate - -3.5).abs() <= 1e-12);
    }

    #[test]
    fn gdp_scatter_keeps_first_occurrence_per_country() {
        let mut first = rec("US", 2021);
        first.gdp_per_capita = 60000.0;
        first.ev_market_share = 0.12;
        let mut duplicate = rec("US", 2021);
        duplicate.gdp_per_capita = 99999.0;
        let older = rec("US", 2020);

        let (ds, idx) = fixture(vec![older, first, duplicate]);
        let view = FilteredView::new(&ds, &idx);
        let points = gdp_vs_share(&view, 2021).expect("agg");

        assert_eq!(points.len(), 1);
        assert!((points[0].gdp_per_capita - 60000.0).abs() <= 1e-12);
        assert!((points[0].ev_share_pct - 12.0).abs() <= 1e-12);
    }

    #[test]
    fn emissions_trend_takes_the_mean_per_year() {
        let mut a = rec("US", 2020);
        a.co2_emissions_transport_mt = 2.0;
        let mut b = rec("DE", 2020);
        b.co2_emissions_transport_mt = 4.0;
        let (ds, idx) = fixture(vec![a, b]);
        let view = FilteredView::new(&ds, &idx);
        let trend = emissions_trend(&view).expect("agg");
        assert_eq!(trend.len(), 1);
        assert!((trend[0].value - 3.0).abs() <= 1e-12);
    }

    #[test]
    fn charging_trend_averages_station_counts() {
        let mut a = rec("US", 2020);
        a.charging_stations = 100;
        let mut b = rec("DE", 2020);
        b.charging_stations = 300;
        let (ds, idx) = fixture(vec![a, b]);
        let view = FilteredView::new(&ds, &idx);
        let trend = charging_trend(&view).expect("agg");
        assert!((trend[0].value - 200.0).abs() <= 1e-12);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&values, 0.25) - 1.75).abs() <= 1e-12);
        assert!((quantile(&values, 0.5) - 2.5).abs() <= 1e-12);
        assert!((quantile(&values, 0.75) - 3.25).abs() <= 1e-12);
        assert!((quantile(&values, 0.0) - 1.0).abs() <= 1e-12);
        assert!((quantile(&values, 1.0) - 4.0).abs() <= 1e-12);
    }

    #[test]
    fn range_distribution_summarises_latest_year_per_region() {
        let mut rows = Vec::new();
        for (i, range) in [400.0, 420.0, 440.0, 460.0].iter().enumerate() {
            let mut r = rec(&format!("c{i}"), 2023);
            r.avg_ev_range_km = *range;
            rows.push(r);
        }
        // Older row must not contribute.
        let mut old = rec("c0", 2020);
        old.avg_ev_range_km = 9999.0;
        rows.push(old);

        let (ds, idx) = fixture(rows);
        let view = FilteredView::new(&ds, &idx);
        let boxes = range_distribution(&view, 2023).expect("agg");

        assert_eq!(boxes.len(), 1);
        let b = &boxes[0];
        assert_eq!(b.region, "Europe");
        assert!((b.min - 400.0).abs() <= 1e-12);
        assert!((b.median - 430.0).abs() <= 1e-12);
        assert!((b.max - 460.0).abs() <= 1e-12);
    }

    #[test]
    fn heatmap_pivot_matches_the_worked_example() {
        let mut a = rec("US", 2020);
        a.ev_market_share = 0.1;
        let mut b = rec("US", 2021);
        b.ev_market_share = 0.2;
        // A second country missing 2020 produces a blank cell, not zero.
        let mut c = rec("DE", 2021);
        c.ev_market_share = 0.3;

        let (ds, idx) = fixture(vec![a, b, c]);
        let view = FilteredView::new(&ds, &idx);
        let hm = market_share_heatmap(&view).expect("agg");

        assert_eq!(hm.countries, vec!["DE", "US"]);
        assert_eq!(hm.years, vec![2020, 2021]);

        let us = &hm.cells[1];
        assert!((us[0].expect("US 2020") - 10.0).abs() <= 1e-12);
        assert!((us[1].expect("US 2021") - 20.0).abs() <= 1e-12);
        assert_eq!(hm.cells[0][0], None);
        assert!((hm.cells[0][1].expect("DE 2021") - 30.0).abs() <= 1e-12);
    }

    #[test]
    fn heatmap_cell_is_the_mean_of_duplicate_keys() {
        let mut a = rec("US", 2020);
        a.ev_market_share = 0.1;
        let mut b = rec("US", 2020);
        b.ev_market_share = 0.3;
        let (ds, idx) = fixture(vec![a, b]);
        let view = FilteredView::new(&ds, &idx);
        let hm = market_share_heatmap(&view).expect("agg");
        assert!((hm.cells[0][0].expect("cell") - 20.0).abs() <= 1e-12);
    }

    #[test]
    fn summary_reduces_the_whole_view() {
        let mut a = sales("US", 2020, 100.0, 900.0, 0.0);
        a.ev_market_share = 0.1;
        a.charging_stations = 500;
        let mut b = sales("US", 2021, 300.0, 700.0, 0.0);
        b.ev_market_share = 0.3;
        b.charging_stations = 1500;

        let (ds, idx) = fixture(vec![a, b]);
        let view = FilteredView::new(&ds, &idx);
        let s = summary(&view).expect("agg");

        assert!((s.total_ev_sales - 400.0).abs() <= 1e-12);
        assert!((s.total_petrol_sales - 1600.0).abs() <= 1e-12);
        assert!((s.mean_ev_share_pct - 20.0).abs() <= 1e-12);
        assert_eq!(s.max_charging_stations, 1500);
    }

    #[test]
    fn every_aggregation_fails_on_an_empty_view() {
        let (ds, _) = fixture(vec![rec("US", 2020)]);
        let empty: Vec<usize> = Vec::new();
        let view = FilteredView::new(&ds, &empty);

        assert!(sales_over_time(&view).is_err());
        assert!(market_share_by_country(&view).is_err());
        assert!(vehicle_type_distribution(&view, 2020).is_err());
        assert!(regional_sales_trend(&view).is_err());
        assert!(growth_rate_points(&view).is_err());
        assert!(gdp_vs_share(&view, 2020).is_err());
        assert!(emissions_trend(&view).is_err());
        assert!(charging_trend(&view).is_err());
        assert!(range_distribution(&view, 2020).is_err());
        assert!(market_share_heatmap(&view).is_err());
        assert!(summary(&view).is_err());
    }

    #[test]
    fn aggregations_are_idempotent_over_the_same_view() {
        let (ds, idx) = fixture(vec![
            sales("US", 2020, 100.0, 900.0, 10.0),
            sales("DE", 2021, 300.0, 700.0, 20.0),
        ]);
        let view = FilteredView::new(&ds, &idx);

        assert_eq!(
            sales_over_time(&view).expect("first"),
            sales_over_time(&view).expect("second")
        );
        assert_eq!(
            market_share_by_country(&view).expect("first"),
            market_share_by_country(&view).expect("second")
        );
        assert_eq!(
            market_share_heatmap(&view).expect("first"),
            market_share_heatmap(&view).expect("second")
        );
    }
}
