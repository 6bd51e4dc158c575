/// Data layer: core types, loading, filtering, and chart aggregations.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalesDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<SalesRecord>, country/region/year indices
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  country set + year range → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   agg     │  per-chart derived tables + summary metrics
///   └──────────┘
/// ```

pub mod agg;
pub mod filter;
pub mod loader;
pub mod model;
