use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;

use super::error::{DatasetError, DateParseError, LoadError};
use super::model::{CellValue, ColumnMap, Dataset, IncidentRecord};

// ---------------------------------------------------------------------------
// Source description and load options
// ---------------------------------------------------------------------------

/// Where a dataset comes from: a local file or an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::Path(PathBuf::from(s))
        }
    }

    /// Lower-cased file extension, ignoring any URL query or fragment.
    fn extension(&self) -> String {
        match self {
            DataSource::Path(path) => extension_of(path),
            DataSource::Url(url) => {
                let end = url.find(['?', '#']).unwrap_or(url.len());
                extension_of(Path::new(&url[..end]))
            }
        }
    }
}

impl FromStr for DataSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DataSource::parse(s))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{url}"),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// How `normalize_dates` treats values it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateParsing {
    /// The first bad value aborts normalization.
    #[default]
    Strict,
    /// Bad rows are dropped and reported.
    Lenient,
}

/// Everything needed to turn a [`DataSource`] into a normalized [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter for delimited files; `None` picks one from the extension.
    pub delimiter: Option<u8>,
    pub date_parsing: DateParsing,
    pub columns: ColumnMap,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset and normalize its date column in one step.
pub fn load_normalized(
    source: &DataSource,
    options: &LoadOptions,
) -> Result<Dataset, DatasetError> {
    let dataset = load(source, options.delimiter)?;
    log::info!(
        "Loaded {} rows with columns {:?} from {source}",
        dataset.len(),
        dataset.column_names
    );

    let normalized = normalize_dates(dataset, &options.columns.occur_date, options.date_parsing)?;
    if !normalized.rejected.is_empty() {
        log::warn!(
            "Skipped {} rows with unparseable '{}' values",
            normalized.rejected.len(),
            options.columns.occur_date
        );
    }
    Ok(normalized.dataset)
}

/// Load a tabular dataset from a path or URL.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.tsv` – header row plus delimited data rows
/// * `.json`    – `[{ "OCCUR_DATE": "...", "BORO": "...", ... }, ...]`
/// * `.parquet` – any flat Arrow schema
///
/// URLs without a recognised extension are read as CSV.
pub fn load(source: &DataSource, delimiter: Option<u8>) -> Result<Dataset, LoadError> {
    match source {
        DataSource::Path(path) => load_file(path, delimiter),
        DataSource::Url(url) => load_url(url, &source.extension(), delimiter),
    }
}

/// Load a dataset from a local file.
pub fn load_file(path: &Path, delimiter: Option<u8>) -> Result<Dataset, LoadError> {
    let ext = extension_of(path);
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    match ext.as_str() {
        "csv" | "txt" | "tsv" => {
            let file = std::fs::File::open(path).map_err(io_err)?;
            read_csv(file, delimiter.unwrap_or_else(|| default_delimiter(&ext)))
        }
        "json" => {
            let text = std::fs::read_to_string(path).map_err(io_err)?;
            read_json(&text)
        }
        "parquet" | "pq" => {
            let file = std::fs::File::open(path).map_err(io_err)?;
            read_parquet(file)
        }
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

fn load_url(url: &str, ext: &str, delimiter: Option<u8>) -> Result<Dataset, LoadError> {
    log::debug!("Fetching {url}");
    let http_err = |source| LoadError::Http {
        url: url.to_string(),
        source,
    };
    let body = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(http_err)?;

    match ext {
        "json" => read_json(&String::from_utf8_lossy(&body)),
        "parquet" | "pq" => read_parquet(body),
        _ => read_csv(
            &body[..],
            delimiter.unwrap_or_else(|| default_delimiter(ext)),
        ),
    }
}

fn default_delimiter(ext: &str) -> u8 {
    if ext == "tsv" { b'\t' } else { b',' }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Read a delimited table: header row with column names, then data rows.
/// Every row must have as many fields as the header.
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let column_names: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if column_names.is_empty() {
        return Err(LoadError::Malformed("table has no header row".to_string()));
    }

    let mut rows: Vec<IncidentRecord> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(Dataset::new(column_names, rows))
}

/// Text that reads as a missing value, matching the default NA markers of
/// pandas' `read_csv`.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s)
}

fn guess_cell_type(s: &str) -> CellValue {
    if is_missing_marker(s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).  Columns appear in
/// first-seen order (serde_json's `preserve_order` keeps each record's key
/// order); a key missing from a record reads as null.
fn read_json(text: &str) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".to_string()))?;

    let mut column_names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), column_names.len());
                column_names.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            let mut row = vec![CellValue::Null; column_names.len()];
            for (key, val) in obj {
                if let Some(&idx) = positions.get(key) {
                    row[idx] = json_to_cell(val);
                }
            }
            row
        })
        .collect();

    Ok(Dataset::new(column_names, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read every record batch of a Parquet file into rows.
///
/// Works with files written by **Pandas** (`df.to_parquet()`), **Polars**
/// and the bundled `generate_sample` binary.
fn read_parquet<T: ChunkReader + 'static>(input: T) -> Result<Dataset, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            let record = columns
                .iter()
                .map(|col| extract_cell_value(col, row))
                .collect::<Result<IncidentRecord, LoadError>>()?;
            rows.push(record);
        }
    }

    Ok(Dataset::new(column_names, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> Result<CellValue, LoadError> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_cell(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => float_cell(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map_or(CellValue::Null, CellValue::Date),
        DataType::Date64 => col
            .as_primitive::<Date64Type>()
            .value_as_date(row)
            .map_or(CellValue::Null, CellValue::Date),
        // Dictionary-encoded categoricals, timestamps, decimals…
        _ => CellValue::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(value)
}

/// NaN is how dataframe writers store a missing float.
fn float_cell(f: f64) -> CellValue {
    if f.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// Date normalization
// ---------------------------------------------------------------------------

/// A row dropped by lenient date normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDate {
    /// Zero-based row index in the dataset as loaded.
    pub row: usize,
    pub value: String,
}

/// Result of [`normalize_dates`].
#[derive(Debug, Clone, PartialEq)]
pub struct DateNormalization {
    pub dataset: Dataset,
    /// Always empty in [`DateParsing::Strict`] mode.
    pub rejected: Vec<RejectedDate>,
}

/// `%Y` accepts any number of digits, so four-digit years are checked after
/// parsing and two-digit years fall through to `%y`.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a calendar date, discarding any time-of-day component.
///
/// Years must be written with four digits, or with two digits in
/// `MM/DD/YY` (00-68 map to 20xx, 69-99 to 19xx).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find(has_four_digit_year)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
                .find(has_four_digit_year)
        })
}

fn has_four_digit_year(date: &NaiveDate) -> bool {
    (1000..=9999).contains(&date.year())
}

/// Convert every cell of the `column` column into a [`CellValue::Date`].
///
/// Empty, null and missing-marker cells (`NaN`, `NULL`, ...) become null
/// dates. A dataset without the column is returned unchanged.
pub fn normalize_dates(
    dataset: Dataset,
    column: &str,
    mode: DateParsing,
) -> Result<DateNormalization, DateParseError> {
    let Some(col) = dataset.column_index(column) else {
        log::debug!("No '{column}' column; skipping date normalization");
        return Ok(DateNormalization {
            dataset,
            rejected: Vec::new(),
        });
    };

    let Dataset { column_names, rows } = dataset;
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (row_no, mut row) in rows.into_iter().enumerate() {
        let Some(cell) = row.get_mut(col) else {
            kept.push(row);
            continue;
        };
        let raw = match &*cell {
            CellValue::Date(_) | CellValue::Null => None,
            other => Some(other.to_string()),
        };

        if let Some(raw) = raw {
            if is_missing_marker(raw.trim()) {
                *cell = CellValue::Null;
                kept.push(row);
                continue;
            }
            match parse_date(&raw) {
                Some(date) => *cell = CellValue::Date(date),
                None => match mode {
                    DateParsing::Strict => {
                        return Err(DateParseError {
                            row: row_no,
                            column: column.to_string(),
                            value: raw,
                        });
                    }
                    DateParsing::Lenient => {
                        log::warn!("Row {row_no}: dropping unparseable date {raw:?}");
                        rejected.push(RejectedDate {
                            row: row_no,
                            value: raw,
                        });
                        continue;
                    }
                },
            }
        }
        kept.push(row);
    }

    Ok(DateNormalization {
        dataset: Dataset::new(column_names, kept),
        rejected,
    })
}
