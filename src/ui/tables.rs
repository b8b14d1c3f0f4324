use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use shootings_explorer::{Dataset, Pivot, ValueCount};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Filtered rows
// ---------------------------------------------------------------------------

/// Scrollable table of the filtered rows, every source column shown.
pub fn filtered_data_table(ui: &mut Ui, dataset: &Dataset, rows: &[usize]) {
    let n_cols = dataset.column_names.len();
    ui.push_id("filtered_data", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(260.0)
                .columns(Column::auto().at_least(60.0), n_cols)
                .header(20.0, |mut header| {
                    for name in &dataset.column_names {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let i = rows[row.index()];
                        for c in 0..n_cols {
                            let cell = dataset.cell(i, c);
                            row.col(|ui: &mut Ui| {
                                if !cell.is_null() {
                                    ui.label(cell.to_string());
                                }
                            });
                        }
                    });
                });
        });
    });
}

// ---------------------------------------------------------------------------
// Aggregate tables
// ---------------------------------------------------------------------------

/// Borough × race counts. Race headers use the chart colours.
pub fn pivot_table(ui: &mut Ui, pivot: &Pivot, row_header: &str, colors: &ColorMap) {
    if pivot.is_empty() {
        ui.label("No incidents to tabulate.");
        return;
    }

    egui::Grid::new("borough_race_pivot")
        .striped(true)
        .spacing([16.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.strong(row_header);
            for race in &pivot.column_labels {
                ui.label(RichText::new(race).strong().color(colors.color_for(race)));
            }
            ui.end_row();

            for (label, counts) in pivot.row_labels.iter().zip(&pivot.counts) {
                ui.strong(label);
                for n in counts {
                    ui.label(n.to_string());
                }
                ui.end_row();
            }
        });
}

/// Two-column value-count table.
pub fn value_count_table(ui: &mut Ui, id: &str, header: &str, counts: &[ValueCount]) {
    egui::Grid::new(id)
        .striped(true)
        .spacing([16.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.strong(header);
            ui.strong("Count");
            ui.end_row();

            for vc in counts {
                ui.label(&vc.value);
                ui.label(vc.count.to_string());
                ui.end_row();
            }
        });
}
