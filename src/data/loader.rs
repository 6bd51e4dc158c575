use std::io::Read;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{REQUIRED_COLUMNS, SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// Everything that can go wrong while turning a file into a [`SalesDataset`].
///
/// A `LoadError` at startup is fatal; one raised from the File → Open…
/// dialog is shown as a status message and the current dataset is kept.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: {message}")]
    Row { row: usize, message: String },

    #[error("dataset contains no rows")]
    Empty,

    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("reading arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the 12 schema columns (the source format)
/// * `.json`    – records-oriented array, `df.to_json(orient='records')`
/// * `.parquet` – scalar columns per the schema
pub fn load_file(path: &Path) -> Result<SalesDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SalesDataset, LoadError> {
    let file = std::fs::File::open(path)?;
    load_csv_reader(file)
}

/// Parse CSV from any reader. Split out so tests can feed in-memory data.
fn load_csv_reader<R: Read>(reader: R) -> Result<SalesDataset, LoadError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col.to_string()));
        }
    }

    let mut records = Vec::new();
    for (row_no, result) in rdr.deserialize::<SalesRecord>().enumerate() {
        let rec = result.map_err(|e| LoadError::Row {
            row: row_no,
            message: e.to_string(),
        })?;
        records.push(rec);
    }

    SalesDataset::from_records(records).ok_or(LoadError::Empty)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "country": "Norway", "region": "Europe", "year": 2023, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SalesDataset, LoadError> {
    let text = std::fs::read_to_string(path)?;
    load_json_str(&text)
}

fn load_json_str(text: &str) -> Result<SalesDataset, LoadError> {
    let root: Vec<JsonValue> = serde_json::from_str(text)?;

    let mut records = Vec::with_capacity(root.len());
    for (row_no, value) in root.into_iter().enumerate() {
        let rec: SalesRecord = serde_json::from_value(value).map_err(|e| LoadError::Row {
            row: row_no,
            message: e.to_string(),
        })?;
        records.push(rec);
    }

    SalesDataset::from_records(records).ok_or(LoadError::Empty)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Column positions within a record batch, resolved once per file.
struct Columns {
    country: usize,
    region: usize,
    year: usize,
    ev_sales: usize,
    petrol_car_sales: usize,
    diesel_car_sales: usize,
    ev_market_share: usize,
    ev_growth_rate_yoy: usize,
    gdp_per_capita: usize,
    charging_stations: usize,
    avg_ev_range_km: usize,
    co2_emissions_transport_mt: usize,
}

impl Columns {
    fn resolve(schema: &arrow::datatypes::Schema) -> Result<Self, LoadError> {
        let idx = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| LoadError::MissingColumn(name.to_string()))
        };
        Ok(Columns {
            country: idx("country")?,
            region: idx("region")?,
            year: idx("year")?,
            ev_sales: idx("ev_sales")?,
            petrol_car_sales: idx("petrol_car_sales")?,
            diesel_car_sales: idx("diesel_car_sales")?,
            ev_market_share: idx("ev_market_share")?,
            ev_growth_rate_yoy: idx("ev_growth_rate_yoy")?,
            gdp_per_capita: idx("gdp_per_capita")?,
            charging_stations: idx("charging_stations")?,
            avg_ev_range_km: idx("avg_ev_range_km")?,
            co2_emissions_transport_mt: idx("co2_emissions_transport_mt")?,
        })
    }
}

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SalesDataset, LoadError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let cols = Columns::resolve(&batch.schema())?;

        for row in 0..batch.num_rows() {
            let str_at = |idx: usize, name: &str| {
                str_value(batch.column(idx), row).ok_or_else(|| LoadError::Row {
                    row,
                    message: format!("column '{name}' is not a string"),
                })
            };
            let f64_at = |idx: usize, name: &str| {
                f64_value(batch.column(idx), row).ok_or_else(|| LoadError::Row {
                    row,
                    message: format!("column '{name}' is not numeric"),
                })
            };
            let i64_at = |idx: usize, name: &str| {
                i64_value(batch.column(idx), row).ok_or_else(|| LoadError::Row {
                    row,
                    message: format!("column '{name}' is not an integer"),
                })
            };

            records.push(SalesRecord {
                country: str_at(cols.country, "country")?,
                region: str_at(cols.region, "region")?,
                year: i64_at(cols.year, "year")? as i32,
                ev_sales: f64_at(cols.ev_sales, "ev_sales")?,
                petrol_car_sales: f64_at(cols.petrol_car_sales, "petrol_car_sales")?,
                diesel_car_sales: f64_at(cols.diesel_car_sales, "diesel_car_sales")?,
                ev_market_share: f64_at(cols.ev_market_share, "ev_market_share")?,
                ev_growth_rate_yoy: f64_at(cols.ev_growth_rate_yoy, "ev_growth_rate_yoy")?,
                gdp_per_capita: f64_at(cols.gdp_per_capita, "gdp_per_capita")?,
                charging_stations: i64_at(cols.charging_stations, "charging_stations")?,
                avg_ev_range_km: f64_at(cols.avg_ev_range_km, "avg_ev_range_km")?,
                co2_emissions_transport_mt: f64_at(
                    cols.co2_emissions_transport_mt,
                    "co2_emissions_transport_mt",
                )?,
            });
        }
    }

    SalesDataset::from_records(records).ok_or(LoadError::Empty)
}

// -- Arrow helpers --

fn str_value(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string()),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| a.value(row).to_string()),
        _ => None,
    }
}

fn i64_value(col: &ArrayRef, row: usize) -> Option<i64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as i64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row)),
        _ => None,
    }
}

fn f64_value(col: &ArrayRef, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        // Pandas writes whole-valued columns as integers depending on dtype.
        DataType::Int32 | DataType::Int64 => i64_value(col, row).map(|v| v as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "country,region,year,ev_sales,petrol_car_sales,diesel_car_sales,\
ev_market_share,ev_growth_rate_yoy,gdp_per_capita,charging_stations,avg_ev_range_km,\
co2_emissions_transport_mt";

    #[test]
    fn csv_round_trips_typed_rows() {
        let csv = format!(
            "{HEADER}\n\
Norway,Europe,2023,150000,40000,10000,0.75,12.5,89000,25000,450,2.1\n\
India,Asia,2023,90000,800000,300000,0.076,44.0,2600,11000,310,290.5\n"
        );
        let ds = load_csv_reader(csv.as_bytes()).expect("load");

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].country, "Norway");
        assert_eq!(ds.records[0].year, 2023);
        assert!((ds.records[0].ev_market_share - 0.75).abs() <= 1e-12);
        assert_eq!(ds.records[1].charging_stations, 11000);
        assert_eq!(ds.countries, vec!["India", "Norway"]);
        assert_eq!((ds.year_min, ds.year_max), (2023, 2023));
    }

    #[test]
    fn csv_missing_column_is_reported_by_name() {
        let csv = "country,region,year\nNorway,Europe,2023\n";
        match load_csv_reader(csv.as_bytes()) {
            Err(LoadError::MissingColumn(col)) => assert_eq!(col, "ev_sales"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_numeric_field_carries_row_number() {
        let csv = format!(
            "{HEADER}\n\
Norway,Europe,2023,150000,40000,10000,0.75,12.5,89000,25000,450,2.1\n\
India,Asia,not-a-year,90000,800000,300000,0.076,44.0,2600,11000,310,290.5\n"
        );
        match load_csv_reader(csv.as_bytes()) {
            Err(LoadError::Row { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected Row error, got {other:?}"),
        }
    }

    #[test]
    fn csv_with_only_a_header_is_empty() {
        let csv = format!("{HEADER}\n");
        assert!(matches!(
            load_csv_reader(csv.as_bytes()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn json_records_parse() {
        let json = r#"[{
            "country": "Norway", "region": "Europe", "year": 2023,
            "ev_sales": 150000.0, "petrol_car_sales": 40000.0, "diesel_car_sales": 10000.0,
            "ev_market_share": 0.75, "ev_growth_rate_yoy": 12.5, "gdp_per_capita": 89000.0,
            "charging_stations": 25000, "avg_ev_range_km": 450.0,
            "co2_emissions_transport_mt": 2.1
        }]"#;
        let ds = load_json_str(json).expect("load");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].region, "Europe");
    }

    #[test]
    fn json_bad_record_carries_row_number() {
        let json = r#"[{"country": "Norway"}]"#;
        match load_json_str(json) {
            Err(LoadError::Row { row, .. }) => assert_eq!(row, 0),
            other => panic!("expected Row error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_rejected_before_io() {
        match load_file(Path::new("sales.txt")) {
            Err(LoadError::UnsupportedFormat(ext)) => assert_eq!(ext, "txt"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }
}
