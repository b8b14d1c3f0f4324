mod app;
mod color;
mod state;
mod ui;

use anyhow::{Context, Result, bail};
use app::ExplorerApp;
use clap::Parser;
use eframe::egui;
use shootings_explorer::{ColumnMap, DataSource, DateParsing, LoadOptions};
use state::AppState;

/// Explore NYPD shooting incidents by date range and borough.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Incident table to open at startup (path or http(s) URL).
    #[arg(env = "SHOOTINGS_SOURCE")]
    source: Option<DataSource>,

    /// Header of the incident date column.
    #[arg(long, default_value = "OCCUR_DATE")]
    date_column: String,

    /// Header of the borough column.
    #[arg(long, default_value = "BORO")]
    borough_column: String,

    /// Header of the perpetrator race column.
    #[arg(long, default_value = "PERP_RACE")]
    race_column: String,

    /// Field delimiter for delimited files (default: from the extension).
    #[arg(long)]
    delimiter: Option<char>,

    /// Drop rows with unparseable dates instead of refusing the file.
    #[arg(long)]
    lenient_dates: bool,
}

impl Args {
    fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = match self.delimiter {
            Some(c) if c.is_ascii() => Some(c as u8),
            Some(c) => bail!("delimiter must be a single ASCII character, got {c:?}"),
            None => None,
        };
        Ok(LoadOptions {
            delimiter,
            date_parsing: if self.lenient_dates {
                DateParsing::Lenient
            } else {
                DateParsing::Strict
            },
            columns: ColumnMap {
                occur_date: self.date_column.clone(),
                borough: self.borough_column.clone(),
                perp_race: self.race_column.clone(),
            },
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut state = AppState::new(args.load_options()?);

    // A source named on the command line must load, or nothing is shown.
    if let Some(source) = &args.source {
        state
            .load_source(source)
            .context("cannot start without the requested dataset")?;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "NYPD Shootings Data Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
