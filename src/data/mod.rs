/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<VideoRecord>, immutable after load
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  PredicateSet → FilteredRows (table order kept)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
