use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::MissingColumnError;
use super::filter::{FilterSelection, FilteredView, apply_filter};
use super::model::{CellValue, ColumnMap, Dataset};

// ---------------------------------------------------------------------------
// Aggregate types
// ---------------------------------------------------------------------------

/// Calendar month bucket, ordered chronologically. Displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year 0, handy as a continuous chart axis.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Inverse of [`YearMonth::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Self {
        YearMonth {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<YearMonth> for String {
    fn from(month: YearMonth) -> Self {
        month.to_string()
    }
}

/// One point of the monthly time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: YearMonth,
    pub count: usize,
}

/// One entry of a value-count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Dense two-dimensional count table. Row and column labels are sorted;
/// `counts[r][c]` is zero for combinations absent from the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pivot {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl Pivot {
    /// Count for a (row, column) label pair; zero when either label is unknown.
    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.row_labels.iter().position(|l| l == row);
        let c = self.column_labels.iter().position(|l| l == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Sum of all cells.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregations over a filtered view
// ---------------------------------------------------------------------------

/// Number of rows in the view.
pub fn count(view: &FilteredView<'_>) -> usize {
    view.len()
}

/// Rows per calendar month, ascending. Months without rows are omitted,
/// as are rows without a date.
pub fn monthly_time_series(view: &FilteredView<'_>) -> Result<Vec<MonthlyCount>, MissingColumnError> {
    let col = view.dataset().require_column(&view.columns().occur_date)?;
    let mut buckets: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for date in view.column_cells(col).filter_map(CellValue::as_date) {
        *buckets.entry(YearMonth::of(date)).or_default() += 1;
    }
    Ok(buckets
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect())
}

/// Rows per (borough, race) pair, reshaped into a borough × race table.
pub fn borough_race_pivot(view: &FilteredView<'_>) -> Result<Pivot, MissingColumnError> {
    let dataset = view.dataset();
    let borough_col = dataset.require_column(&view.columns().borough)?;
    let race_col = dataset.require_column(&view.columns().perp_race)?;

    let mut groups: BTreeMap<(String, String), usize> = BTreeMap::new();
    for &i in view.indices() {
        let key = (
            dataset.cell(i, borough_col).label(),
            dataset.cell(i, race_col).label(),
        );
        *groups.entry(key).or_default() += 1;
    }

    let mut row_labels: Vec<String> = groups.keys().map(|(b, _)| b.clone()).collect();
    row_labels.dedup();
    let mut column_labels: Vec<String> = groups.keys().map(|(_, r)| r.clone()).collect();
    column_labels.sort();
    column_labels.dedup();

    let mut counts = vec![vec![0; column_labels.len()]; row_labels.len()];
    for ((borough, race), n) in groups {
        // Both searches succeed: the label lists were built from these keys.
        if let (Ok(r), Ok(c)) = (row_labels.binary_search(&borough), column_labels.binary_search(&race)) {
            counts[r][c] = n;
        }
    }

    Ok(Pivot {
        row_labels,
        column_labels,
        counts,
    })
}

/// Rows per race, most frequent first. Equal counts keep first-seen order.
pub fn race_value_counts(view: &FilteredView<'_>) -> Result<Vec<ValueCount>, MissingColumnError> {
    let col = view.dataset().require_column(&view.columns().perp_race)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();
    for cell in view.column_cells(col) {
        let label = cell.label();
        match positions.get(&label) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                positions.insert(label.clone(), counts.len());
                counts.push(ValueCount { value: label, count: 1 });
            }
        }
    }
    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Summary: everything the dashboard shows for one selection
// ---------------------------------------------------------------------------

/// Filtered rows plus every derived aggregate for one [`FilterSelection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub selection: FilterSelection,
    /// Indices of the filtered rows in the dataset.
    #[serde(skip)]
    pub rows: Vec<usize>,
    pub total: usize,
    pub monthly: Vec<MonthlyCount>,
    pub pivot: Pivot,
    pub race_counts: Vec<ValueCount>,
}

impl Summary {
    pub fn empty(selection: FilterSelection) -> Self {
        Summary {
            selection,
            rows: Vec::new(),
            total: 0,
            monthly: Vec::new(),
            pivot: Pivot::default(),
            race_counts: Vec::new(),
        }
    }
}

/// Filter `dataset` and compute all aggregates.
///
/// Never fails: a missing column yields an empty summary and a warning so the
/// interactive session stays usable.
pub fn summarize(dataset: &Dataset, columns: &ColumnMap, selection: &FilterSelection) -> Summary {
    match try_summarize(dataset, columns, selection) {
        Ok(summary) => summary,
        Err(e) => {
            log::warn!("Cannot summarize selection {selection:?}: {e}");
            Summary::empty(selection.clone())
        }
    }
}

fn try_summarize(
    dataset: &Dataset,
    columns: &ColumnMap,
    selection: &FilterSelection,
) -> Result<Summary, MissingColumnError> {
    let view = apply_filter(dataset, columns, selection)?;
    let total = count(&view);
    let monthly = monthly_time_series(&view)?;
    let pivot = borough_race_pivot(&view)?;
    let race_counts = race_value_counts(&view)?;
    log::debug!(
        "Selection {} → {} .. {} in {}: {total} incidents",
        selection.borough,
        selection.date_start,
        selection.date_end,
        dataset.len()
    );

    Ok(Summary {
        selection: selection.clone(),
        rows: view.into_indices(),
        total,
        monthly,
        pivot,
        race_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::BoroughSelection;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset(rows: &[(NaiveDate, &str, Option<&str>)]) -> Dataset {
        Dataset::new(
            vec!["OCCUR_DATE".into(), "BORO".into(), "PERP_RACE".into()],
            rows.iter()
                .map(|(d, b, r)| {
                    vec![
                        CellValue::Date(*d),
                        CellValue::String(b.to_string()),
                        r.map_or(CellValue::Null, |r| CellValue::String(r.to_string())),
                    ]
                })
                .collect(),
        )
    }

    fn everything() -> FilterSelection {
        FilterSelection::new(NaiveDate::MIN, NaiveDate::MAX, BoroughSelection::All)
    }

    #[test]
    fn year_month_orders_and_prints() {
        let jan = YearMonth::of(ymd(2021, 1, 31));
        let dec = YearMonth::of(ymd(2020, 12, 1));
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2021-01");
        assert_eq!(YearMonth::from_ordinal(jan.ordinal()), jan);
        assert_eq!(jan.ordinal() - dec.ordinal(), 1);
    }

    #[test]
    fn monthly_series_is_sparse_and_ascending() {
        let ds = dataset(&[
            (ymd(2020, 3, 9), "BRONX", None),
            (ymd(2020, 1, 2), "BRONX", None),
            (ymd(2020, 3, 1), "QUEENS", None),
        ]);
        let cols = ColumnMap::default();
        let view = FilteredView::all(&ds, &cols);
        let series = monthly_time_series(&view).unwrap();
        let flat: Vec<(String, usize)> = series.iter().map(|m| (m.month.to_string(), m.count)).collect();
        assert_eq!(flat, vec![("2020-01".to_string(), 1), ("2020-03".to_string(), 2)]);
    }

    #[test]
    fn pivot_fills_missing_pairs_with_zero() {
        let ds = dataset(&[
            (ymd(2020, 1, 1), "QUEENS", Some("WHITE")),
            (ymd(2020, 1, 1), "BRONX", Some("BLACK")),
            (ymd(2020, 1, 1), "BRONX", None),
            (ymd(2020, 1, 1), "BRONX", Some("BLACK")),
        ]);
        let cols = ColumnMap::default();
        let pivot = borough_race_pivot(&FilteredView::all(&ds, &cols)).unwrap();
        assert_eq!(pivot.row_labels, vec!["BRONX", "QUEENS"]);
        assert_eq!(pivot.column_labels, vec!["<null>", "BLACK", "WHITE"]);
        assert_eq!(pivot.counts, vec![vec![1, 2, 0], vec![0, 0, 1]]);
        assert_eq!(pivot.get("QUEENS", "BLACK"), 0);
        assert_eq!(pivot.get("STATEN ISLAND", "BLACK"), 0);
        assert_eq!(pivot.total(), 4);
    }

    #[test]
    fn value_counts_break_ties_by_first_appearance() {
        let ds = dataset(&[
            (ymd(2020, 1, 1), "BRONX", Some("WHITE")),
            (ymd(2020, 1, 1), "BRONX", Some("BLACK")),
            (ymd(2020, 1, 1), "BRONX", None),
            (ymd(2020, 1, 1), "BRONX", Some("BLACK")),
            (ymd(2020, 1, 1), "BRONX", Some("ASIAN / PACIFIC ISLANDER")),
        ]);
        let cols = ColumnMap::default();
        let counts = race_value_counts(&FilteredView::all(&ds, &cols)).unwrap();
        let flat: Vec<(&str, usize)> = counts.iter().map(|v| (v.value.as_str(), v.count)).collect();
        assert_eq!(
            flat,
            vec![
                ("BLACK", 2),
                ("WHITE", 1),
                ("<null>", 1),
                ("ASIAN / PACIFIC ISLANDER", 1),
            ]
        );
    }

    #[test]
    fn literal_null_label_shares_the_missing_category() {
        let ds = dataset(&[
            (ymd(2020, 1, 1), "<null>", Some("<null>")),
            (ymd(2020, 1, 1), "BRONX", None),
        ]);
        let cols = ColumnMap::default();
        let counts = race_value_counts(&FilteredView::all(&ds, &cols)).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!((counts[0].value.as_str(), counts[0].count), ("<null>", 2));

        let sel = FilterSelection {
            borough: BoroughSelection::from_label("<null>"),
            ..everything()
        };
        assert_eq!(summarize(&ds, &cols, &sel).rows, vec![0]);
    }

    #[test]
    fn empty_view_yields_empty_aggregates() {
        let ds = dataset(&[(ymd(2020, 1, 1), "BRONX", Some("BLACK"))]);
        let cols = ColumnMap::default();
        let sel = FilterSelection::new(ymd(2021, 1, 1), ymd(2021, 12, 31), BoroughSelection::All);
        let summary = summarize(&ds, &cols, &sel);
        assert_eq!(summary, Summary::empty(sel));
    }

    #[test]
    fn missing_race_column_fails_closed() {
        let mut ds = dataset(&[(ymd(2020, 1, 1), "BRONX", Some("BLACK"))]);
        ds.column_names[2] = "RACE".into();
        let cols = ColumnMap::default();
        assert_eq!(
            race_value_counts(&FilteredView::all(&ds, &cols)).unwrap_err().column,
            "PERP_RACE"
        );
        let summary = summarize(&ds, &cols, &everything());
        assert_eq!(summary.total, 0);
        assert!(summary.pivot.is_empty());
    }

    #[test]
    fn summary_serializes_months_as_text() {
        let ds = dataset(&[(ymd(2020, 1, 15), "BRONX", Some("BLACK"))]);
        let summary = summarize(&ds, &ColumnMap::default(), &everything());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["monthly"][0]["month"], "2020-01");
        assert_eq!(json["total"], 1);
        assert!(json.get("rows").is_none());
    }
}
