use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::MissingColumnError;
use super::model::{CellValue, ColumnMap, Dataset};

// ---------------------------------------------------------------------------
// Filter selection: date bounds plus an optional borough constraint
// ---------------------------------------------------------------------------

/// Borough constraint of a [`FilterSelection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum BoroughSelection {
    /// No constraint.
    #[default]
    All,
    Only(String),
}

impl BoroughSelection {
    /// Label of the sentinel entry at the top of the borough selector.
    pub const ALL_LABEL: &'static str = "All";

    /// Inverse of `Display`: the selector label "All" maps to the sentinel.
    pub fn from_label(label: &str) -> Self {
        if label == Self::ALL_LABEL {
            BoroughSelection::All
        } else {
            BoroughSelection::Only(label.to_string())
        }
    }

    fn matches(&self, cell: &CellValue) -> bool {
        match self {
            BoroughSelection::All => true,
            BoroughSelection::Only(borough) => !cell.is_null() && cell.label() == *borough,
        }
    }
}

impl fmt::Display for BoroughSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoroughSelection::All => write!(f, "{}", Self::ALL_LABEL),
            BoroughSelection::Only(borough) => write!(f, "{borough}"),
        }
    }
}

/// The user's chosen date bounds (both inclusive) and borough constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterSelection {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub borough: BoroughSelection,
}

impl FilterSelection {
    pub fn new(date_start: NaiveDate, date_end: NaiveDate, borough: BoroughSelection) -> Self {
        FilterSelection {
            date_start,
            date_end,
            borough,
        }
    }

    /// Default selection for a freshly loaded dataset: its whole date range
    /// and every borough. A dataset without dates gets an unbounded range.
    pub fn initial(dataset: &Dataset, columns: &ColumnMap) -> Self {
        let (start, end) = date_bounds(dataset, columns).unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        FilterSelection::new(start, end, BoroughSelection::All)
    }

    /// Same selection with the bounds swapped if they are inverted.
    pub fn normalized(self) -> Self {
        if self.date_start > self.date_end {
            FilterSelection {
                date_start: self.date_end,
                date_end: self.date_start,
                borough: self.borough,
            }
        } else {
            self
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }
}

// ---------------------------------------------------------------------------
// Filtered view: row indices into a borrowed dataset
// ---------------------------------------------------------------------------

/// Read-only subset of a [`Dataset`], kept as row indices in source order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    columns: &'a ColumnMap,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// View over every row of `dataset`.
    pub fn all(dataset: &'a Dataset, columns: &'a ColumnMap) -> Self {
        FilteredView {
            dataset,
            columns,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Keep the rows of this view that satisfy `selection`.
    ///
    /// A row passes when:
    /// * the borough constraint is `All`, or its borough equals the selected one
    /// * its date lies within `date_start..=date_end` (rows without a date never pass)
    ///
    /// Inverted bounds produce an empty view rather than an error.
    pub fn refine(&self, selection: &FilterSelection) -> Result<FilteredView<'a>, MissingColumnError> {
        if selection.date_start > selection.date_end {
            return Ok(self.with_indices(Vec::new()));
        }

        let date_col = self.dataset.require_column(&self.columns.occur_date)?;
        let borough_col = match selection.borough {
            BoroughSelection::All => None,
            BoroughSelection::Only(_) => Some(self.dataset.require_column(&self.columns.borough)?),
        };

        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| {
                if let Some(col) = borough_col {
                    if !selection.borough.matches(self.dataset.cell(i, col)) {
                        return false;
                    }
                }
                self.dataset
                    .cell(i, date_col)
                    .as_date()
                    .is_some_and(|d| selection.contains_date(d))
            })
            .collect();

        Ok(self.with_indices(indices))
    }

    fn with_indices(&self, indices: Vec<usize>) -> FilteredView<'a> {
        FilteredView {
            dataset: self.dataset,
            columns: self.columns,
            indices,
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn columns(&self) -> &'a ColumnMap {
        self.columns
    }

    /// Row indices into the underlying dataset, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Cells of one column for every row of the view.
    pub(crate) fn column_cells(&self, column: usize) -> impl Iterator<Item = &'a CellValue> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| dataset.cell(i, column))
    }
}

/// Rows of `dataset` satisfying `selection`, in source order.
pub fn apply_filter<'a>(
    dataset: &'a Dataset,
    columns: &'a ColumnMap,
    selection: &FilterSelection,
) -> Result<FilteredView<'a>, MissingColumnError> {
    FilteredView::all(dataset, columns).refine(selection)
}

// ---------------------------------------------------------------------------
// Selector contents
// ---------------------------------------------------------------------------

/// Entries for the borough selector: "All" followed by every distinct
/// non-null borough in first-seen order.
pub fn borough_options(dataset: &Dataset, columns: &ColumnMap) -> Result<Vec<String>, MissingColumnError> {
    let col = dataset.require_column(&columns.borough)?;
    let mut options = vec![BoroughSelection::ALL_LABEL.to_string()];
    options.extend(
        dataset
            .distinct_values(col)
            .into_iter()
            .filter(|v| !v.is_null())
            .map(CellValue::label),
    );
    Ok(options)
}

/// Earliest and latest normalized date in the whole dataset.
pub fn date_bounds(dataset: &Dataset, columns: &ColumnMap) -> Option<(NaiveDate, NaiveDate)> {
    let col = dataset.column_index(&columns.occur_date)?;
    dataset.date_range(col)
}
