/// Data layer: core types, loading, aggregation, filtering, projections.
///
/// Architecture:
/// ```text
///  .tsv.gz / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse files → Dataset (memoized per path pair)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  per-channel mean deltas, inner join with metadata
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  category/range/count predicates → kept rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ project   │  top-N, category means, correlation, time slice
///   └──────────┘
/// ```
///
/// Everything below the loader is a pure function of its inputs; each user
/// interaction re-runs the pipeline from the cached tables down.

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod project;
