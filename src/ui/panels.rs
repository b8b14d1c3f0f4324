use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use shootings_explorer::{BoroughSelection, DataSource, Summary};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // ---- Date range ----
    ui.strong("Select Date Range");
    match state.date_bounds {
        Some((first, last)) => {
            egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("From");
                ui.add(DatePickerButton::new(&mut state.selection.date_start).id_salt("date_start"));
                ui.end_row();
                ui.label("To");
                ui.add(DatePickerButton::new(&mut state.selection.date_end).id_salt("date_end"));
                ui.end_row();
            });
            ui.small(format!("Data covers {first} to {last}"));
        }
        None => {
            ui.label("No incident dates in this dataset.");
        }
    }
    ui.separator();

    // ---- Borough selector ----
    ui.strong("Select Borough");
    let options = state.borough_options.clone();
    let current = state.selection.borough.to_string();
    egui::ComboBox::from_id_salt("borough")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for option in &options {
                if ui.selectable_label(current == *option, option).clicked() {
                    state.selection.borough = BoroughSelection::from_label(option);
                }
            }
        });
    ui.separator();

    if ui.button("Reset filters").clicked() {
        state.reset_filters();
    }

    // Recompute aggregates after any widget change.
    state.refresh();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.summary.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export summary…"))
                .clicked()
            {
                export_summary_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let matching = state.summary.as_ref().map_or(0, |s| s.total);
            ui.label(format!("{} incidents loaded, {matching} matching", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incident data")
        .add_filter("Supported files", &["csv", "tsv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_source(&DataSource::Path(path)) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_summary_dialog(state: &mut AppState) {
    let Some(summary) = &state.summary else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export summary")
        .set_file_name("summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match write_summary(&path, summary) {
            Ok(()) => {
                log::info!("Wrote summary to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Write the aggregates of `summary` as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).context("serializing summary")?;
    writer.flush().context("flushing summary")?;
    Ok(())
}
