/// Data layer: core types, loading, and the aggregation pipeline.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TransactionDataset (malformed rows counted)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  mall → gender × age bin → date range → categories
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  age bins, group counts, per-category count / profit
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  trend    │  month × category pivot, quarter / year gridlines
///   └──────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod trend;
