use std::fmt;

use chrono::NaiveDate;

use super::error::MissingColumnError;

/// Label used for a missing (null) cell wherever a category key is needed.
pub const NULL_LABEL: &str = "<null>";

static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the incident table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Ordered so it can key `BTreeMap` / `BTreeSet` downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Calendar date, produced by date normalization or typed columnar input.
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, "{NULL_LABEL}"),
        }
    }
}

impl CellValue {
    /// The calendar date held by this cell, if it has been normalized to one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Category key used by group-by style aggregates.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

// ---------------------------------------------------------------------------
// ColumnMap – logical column → physical header
// ---------------------------------------------------------------------------

/// Maps the three logical columns the pipeline reads to source headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub occur_date: String,
    pub borough: String,
    pub perp_race: String,
}

impl Default for ColumnMap {
    /// Headers used by the NYPD shooting incident export.
    fn default() -> Self {
        Self {
            occur_date: "OCCUR_DATE".to_string(),
            borough: "BORO".to_string(),
            perp_race: "PERP_RACE".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// One row of the source table, cells in `Dataset::column_names` order.
pub type IncidentRecord = Vec<CellValue>;

/// The full in-memory table: header names plus rows in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in source order.
    pub column_names: Vec<String>,
    /// All rows; every row has exactly `column_names.len()` cells.
    pub rows: Vec<IncidentRecord>,
}

impl Dataset {
    pub fn new(column_names: Vec<String>, rows: Vec<IncidentRecord>) -> Self {
        Dataset { column_names, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Like [`Dataset::column_index`] but reports absence as an error.
    pub fn require_column(&self, name: &str) -> Result<usize, MissingColumnError> {
        self.column_index(name).ok_or_else(|| MissingColumnError {
            column: name.to_string(),
        })
    }

    /// Cell at (`row`, `column`); `Null` when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL_CELL)
    }

    /// Distinct values of a column in first-seen order.
    pub fn distinct_values(&self, column: usize) -> Vec<&CellValue> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Smallest and largest date found in a column, ignoring non-date cells.
    pub fn date_range(&self, column: usize) -> Option<(NaiveDate, NaiveDate)> {
        self.rows
            .iter()
            .filter_map(|r| r.get(column).and_then(CellValue::as_date))
            .fold(None, |acc, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
    }
}
