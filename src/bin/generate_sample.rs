use anyhow::{Context, Result};
use serde::Serialize;

/// Output schema, matching the dashboard's expected header row.
#[derive(Serialize)]
struct SalesRow {
    country: String,
    region: String,
    year: i32,
    ev_sales: f64,
    petrol_car_sales: f64,
    diesel_car_sales: f64,
    ev_market_share: f64,
    ev_growth_rate_yoy: f64,
    gdp_per_capita: f64,
    charging_stations: i64,
    avg_ev_range_km: f64,
    co2_emissions_transport_mt: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (country, region, GDP per capita in 2015, total yearly car market,
///  EV share in 2015, yearly EV share growth factor)
const COUNTRIES: [(&str, &str, f64, f64, f64, f64); 18] = [
    ("Norway", "Europe", 74000.0, 160_000.0, 0.22, 1.24),
    ("Sweden", "Europe", 51000.0, 350_000.0, 0.08, 1.28),
    ("Netherlands", "Europe", 45000.0, 420_000.0, 0.09, 1.22),
    ("Germany", "Europe", 41000.0, 3_200_000.0, 0.02, 1.38),
    ("France", "Europe", 36000.0, 1_900_000.0, 0.015, 1.36),
    ("United Kingdom", "Europe", 40000.0, 2_300_000.0, 0.012, 1.40),
    ("Denmark", "Europe", 53000.0, 220_000.0, 0.04, 1.34),
    ("China", "Asia", 8000.0, 24_000_000.0, 0.013, 1.48),
    ("Japan", "Asia", 34000.0, 4_200_000.0, 0.008, 1.18),
    ("South Korea", "Asia", 27000.0, 1_500_000.0, 0.006, 1.36),
    ("India", "Asia", 1600.0, 3_000_000.0, 0.001, 1.52),
    ("United States", "North America", 56000.0, 17_000_000.0, 0.007, 1.32),
    ("Canada", "North America", 43000.0, 1_900_000.0, 0.006, 1.34),
    ("Mexico", "North America", 9000.0, 1_350_000.0, 0.001, 1.30),
    ("Brazil", "South America", 8800.0, 2_100_000.0, 0.0005, 1.42),
    ("Chile", "South America", 13500.0, 380_000.0, 0.001, 1.38),
    ("Australia", "Oceania", 56000.0, 1_100_000.0, 0.004, 1.40),
    ("South Africa", "Africa", 5700.0, 550_000.0, 0.0008, 1.30),
];

const FIRST_YEAR: i32 = 2015;
const LAST_YEAR: i32 = 2024;

const OUTPUT_PATH: &str = "ev_vs_petrol_dataset_v3.csv";

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(OUTPUT_PATH)
        .with_context(|| format!("creating {OUTPUT_PATH}"))?;

    let mut n_rows = 0usize;
    for (country, region, gdp_2015, market, share_2015, share_growth) in COUNTRIES {
        let mut prev_ev_sales: Option<f64> = None;

        for year in FIRST_YEAR..=LAST_YEAR {
            let t = (year - FIRST_YEAR) as f64;

            // EV adoption grows geometrically, capped below full saturation.
            let share = (share_2015 * share_growth.powf(t)).min(0.92)
                * (1.0 + rng.gauss(0.0, 0.04)).clamp(0.7, 1.3);
            let total = market * (1.0 + rng.gauss(0.0, 0.03));

            let ev_sales = (total * share).round();
            // Diesel's slice of the combustion market shrinks over the decade.
            let diesel_frac = (0.38 - 0.025 * t).max(0.08);
            let combustion = total - ev_sales;
            let diesel_car_sales = (combustion * diesel_frac).round();
            let petrol_car_sales = (combustion - diesel_car_sales).round();

            let ev_growth_rate_yoy = match prev_ev_sales {
                Some(prev) if prev > 0.0 => ((ev_sales - prev) / prev * 100.0 * 100.0).round() / 100.0,
                _ => (rng.gauss(40.0, 12.0) * 100.0).round() / 100.0,
            };
            prev_ev_sales = Some(ev_sales);

            let gdp_per_capita =
                (gdp_2015 * 1.02f64.powf(t) * (1.0 + rng.gauss(0.0, 0.015))).round();
            let charging_stations =
                ((ev_sales * 0.12 + 500.0) * (1.0 + rng.gauss(0.0, 0.1))).round() as i64;
            let avg_ev_range_km = (250.0 + 24.0 * t + rng.gauss(0.0, 12.0)).round();
            // Transport CO2 eases off as the fleet electrifies.
            let co2_emissions_transport_mt =
                ((total / 1e6) * 48.0 * (1.0 - 0.55 * share) * (1.0 + rng.gauss(0.0, 0.05))
                    * 100.0)
                    .round()
                    / 100.0;

            writer
                .serialize(SalesRow {
                    country: country.to_string(),
                    region: region.to_string(),
                    year,
                    ev_sales,
                    petrol_car_sales,
                    diesel_car_sales,
                    ev_market_share: (share * 10_000.0).round() / 10_000.0,
                    ev_growth_rate_yoy,
                    gdp_per_capita,
                    charging_stations: charging_stations.max(0),
                    avg_ev_range_km,
                    co2_emissions_transport_mt,
                })
                .with_context(|| format!("writing row for {country} {year}"))?;
            n_rows += 1;
        }
    }

    writer.flush().context("flushing CSV")?;
    println!(
        "Wrote {n_rows} rows ({} countries, {FIRST_YEAR}..={LAST_YEAR}) to {OUTPUT_PATH}",
        COUNTRIES.len()
    );
    Ok(())
}
