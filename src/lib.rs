//! Filter-and-aggregate pipeline behind the NYPD shootings explorer.
//!
//! Load once with [`data::loader::load_normalized`], then call
//! [`data::aggregate::summarize`] for every [`data::filter::FilterSelection`].

pub mod data;

pub use data::aggregate::{
    MonthlyCount, Pivot, Summary, ValueCount, YearMonth, borough_race_pivot, count,
    monthly_time_series, race_value_counts, summarize,
};
pub use data::error::{DatasetError, DateParseError, LoadError, MissingColumnError};
pub use data::filter::{
    BoroughSelection, FilterSelection, FilteredView, apply_filter, borough_options, date_bounds,
};
pub use data::loader::{
    DataSource, DateNormalization, DateParsing, LoadOptions, RejectedDate, load, load_normalized,
    normalize_dates,
};
pub use data::model::{CellValue, ColumnMap, Dataset, IncidentRecord, NULL_LABEL};
