use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints};

use shootings_explorer::{Summary, YearMonth};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Incidents over time (line chart)
// ---------------------------------------------------------------------------

/// Monthly incident counts. The x axis is [`YearMonth::ordinal`], so
/// months missing from the sparse series show up as gaps between points.
pub fn incidents_over_time(ui: &mut Ui, summary: &Summary) {
    if summary.monthly.is_empty() {
        ui.label("No incidents in the selected range.");
        return;
    }

    let points: PlotPoints = summary
        .monthly
        .iter()
        .map(|m| [m.month.ordinal() as f64, m.count as f64])
        .collect();

    Plot::new("incidents_over_time")
        .height(240.0)
        .x_axis_label("Month")
        .y_axis_label("Incidents")
        .x_axis_formatter(|mark: GridMark, _range| {
            whole(mark.value)
                .map(|ordinal| YearMonth::from_ordinal(ordinal).to_string())
                .unwrap_or_default()
        })
        .label_formatter(|_name, value| {
            format!(
                "{}: {:.0}",
                YearMonth::from_ordinal(value.x.round() as i64),
                value.y
            )
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Incidents").width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Count by race (bar chart)
// ---------------------------------------------------------------------------

/// One bar per race label, in value-count order.
pub fn race_bar_chart(ui: &mut Ui, summary: &Summary, colors: &ColorMap) {
    if summary.race_counts.is_empty() {
        return;
    }

    let bars: Vec<Bar> = summary
        .race_counts
        .iter()
        .enumerate()
        .map(|(i, vc)| {
            Bar::new(i as f64, vc.count as f64)
                .name(&vc.value)
                .fill(colors.color_for(&vc.value))
                .width(0.7)
        })
        .collect();
    let labels: Vec<String> = summary.race_counts.iter().map(|vc| vc.value.clone()).collect();

    Plot::new("race_counts")
        .height(220.0)
        .y_axis_label("Incidents")
        .x_axis_formatter(move |mark: GridMark, _range| {
            whole(mark.value)
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| labels.get(i).cloned())
                .unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// `Some(n)` when `value` sits on an integer grid line.
fn whole(value: f64) -> Option<i64> {
    let rounded = value.round();
    ((value - rounded).abs() < 1e-6).then_some(rounded as i64)
}
