use anyhow::{Context, Result};
use chrono::NaiveDate;

use shootings_explorer::{
    BoroughSelection, CellValue, DataSource, Dataset, FilterSelection, LoadOptions, Summary,
    borough_options, date_bounds, load_normalized, summarize,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// How sources are read and which headers hold the pipeline's columns.
    pub options: LoadOptions,

    /// Loaded dataset (None until a source is loaded).
    pub dataset: Option<Dataset>,

    /// Borough selector entries, "All" first.
    pub borough_options: Vec<String>,

    /// Earliest and latest incident date of the unfiltered dataset.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,

    /// Selection currently shown by the filter widgets.
    pub selection: FilterSelection,

    /// Aggregates for the last applied selection (cached).
    pub summary: Option<Summary>,

    /// One colour per race label for the charts and tables.
    pub race_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            dataset: None,
            borough_options: vec![BoroughSelection::ALL_LABEL.to_string()],
            date_bounds: None,
            selection: FilterSelection::new(NaiveDate::MIN, NaiveDate::MAX, BoroughSelection::All),
            summary: None,
            race_colors: ColorMap::default(),
            status_message: None,
        }
    }

    /// Load and normalize `source`, replacing the current dataset on success.
    pub fn load_source(&mut self, source: &DataSource) -> Result<()> {
        let dataset = load_normalized(source, &self.options)
            .with_context(|| format!("loading {source}"))?;
        log::info!("Loaded {} incidents from {source}", dataset.len());
        self.set_dataset(dataset);
        Ok(())
    }

    /// Ingest a newly loaded dataset, reset filters and recompute.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let columns = &self.options.columns;
        self.borough_options = borough_options(&dataset, columns).unwrap_or_else(|e| {
            log::warn!("{e}; borough filter disabled");
            vec![BoroughSelection::ALL_LABEL.to_string()]
        });
        self.date_bounds = date_bounds(&dataset, columns);
        self.selection = FilterSelection::initial(&dataset, columns);
        self.race_colors = match dataset.column_index(&columns.perp_race) {
            Some(col) => ColorMap::new(dataset.distinct_values(col).into_iter().map(CellValue::label)),
            None => ColorMap::default(),
        };

        self.dataset = Some(dataset);
        self.summary = None;
        self.status_message = None;
        self.refresh();
    }

    /// Back to the whole date range and every borough.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection = FilterSelection::initial(ds, &self.options.columns);
            self.refresh();
        }
    }

    /// Recompute the summary if the selection changed since the last pass.
    pub fn refresh(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let selection = self.selection.clone().normalized();
        if self.summary.as_ref().is_some_and(|s| s.selection == selection) {
            return;
        }
        self.summary = Some(summarize(ds, &self.options.columns, &selection));
    }
}
