use std::path::PathBuf;

use thiserror::Error;

/// The source could not be reached or read as a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed CSV")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON")]
    Json(#[from] serde_json::Error),
    #[error("malformed Parquet")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("malformed Arrow data")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Malformed(String),
}

/// A date cell held text that matches none of the accepted date formats.
///
/// `row` is the zero-based index of the row within the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: cannot parse {value:?} in column '{column}' as a date")]
pub struct DateParseError {
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// An operation needed a column the dataset does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dataset has no '{column}' column")]
pub struct MissingColumnError {
    pub column: String,
}

/// Anything that can abort loading a dataset at startup.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    DateParse(#[from] DateParseError),
}
