//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet  (path or URL)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse table → Dataset, normalize OCCUR_DATE
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset   │  column names, Vec<IncidentRecord>
//!   └──────────┘
//!        │   + FilterSelection
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  date range + borough → FilteredView (row indices)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  count, monthly series, borough × race pivot, race counts
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
