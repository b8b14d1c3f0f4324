use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ExplorerApp {
    pub state: AppState,
}

impl ExplorerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tables and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &self.state));
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("NYPD Shootings Data Explorer");
    ui.label("Analyze NYPD shooting incidents by date range and borough.");
    ui.separator();

    let (Some(dataset), Some(summary)) = (&state.dataset, &state.summary) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore incidents  (File → Open…)");
        });
        return;
    };
    let columns = &state.options.columns;

    ui.heading("Filtered Data");
    tables::filtered_data_table(ui, dataset, &summary.rows);
    ui.add_space(8.0);

    ui.heading("Statistics");
    ui.label(format!("Total Incidents: {}", summary.total));
    ui.add_space(8.0);

    ui.heading("Incidents Over Time");
    plot::incidents_over_time(ui, summary);
    ui.add_space(8.0);

    ui.heading("Incidents by Borough");
    tables::pivot_table(ui, &summary.pivot, &columns.borough, &state.race_colors);
    ui.add_space(8.0);

    ui.heading("Count by Race");
    tables::value_count_table(ui, "race_counts", &columns.perp_race, &summary.race_counts);
    plot::race_bar_chart(ui, summary, &state.race_colors);
}
