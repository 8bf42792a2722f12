/// Data layer: core types, loading, and grouping.
///
/// Architecture:
/// ```text
///  seed ──► synthetic ─┐
///                      ├──► Vec<ObservationRow>  (sorted per floater)
///  .csv / .json / ──► loader ─┘        │
///  .parquet                            ▼
///                               ┌────────────┐
///                               │   index    │  group by float_id
///                               └────────────┘
///                                      │
///                                      ▼
///                                   Dataset     immutable per load
/// ```

pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod source;
pub mod synthetic;
