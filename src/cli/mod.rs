//! Command-line parsing for the policy-rate comparison tool.
//!
//! The goal of this module is to keep **argument parsing** and **source
//! resolution** separate from the store/resolver code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DashboardConfig, SeriesId, SourceKind, SourceSpec};
use crate::error::AppError;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rates", version, about = "Compare two central-bank policy-rate series on a shared timeline")]
pub struct Cli {
    /// Enable verbose logging (debug level, to stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the load summary, the comparison table for the selected dates, and a chart.
    Show(ShowArgs),
    /// List every selectable date (the merged timeline).
    Dates(SourceArgs),
    /// Write the comparison for the selected dates to CSV and/or JSON.
    Export(ExportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same session pipeline as `rates show`, but lets you pick
    /// dates from the timeline with the keyboard.
    Tui(TuiArgs),
}

/// Where the two series come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// CSV file for series A (e.g. a FRED `FEDFUNDS.csv` download).
    #[arg(long, value_name = "CSV")]
    pub fed: Option<PathBuf>,

    /// CSV file for series B (e.g. an ECB Data Portal export).
    #[arg(long, value_name = "CSV")]
    pub ecb: Option<PathBuf>,

    /// Label for series A.
    #[arg(long, default_value = "FED")]
    pub fed_label: String,

    /// Label for series B.
    #[arg(long, default_value = "ECB")]
    pub ecb_label: String,

    /// Rate column name in the series A CSV (auto-detected when omitted).
    #[arg(long)]
    pub fed_column: Option<String>,

    /// Rate column name in the series B CSV (auto-detected when omitted).
    #[arg(long)]
    pub ecb_column: Option<String>,

    /// Fetch series A from FRED instead of a CSV (needs FRED_API_KEY).
    #[arg(long, value_name = "SERIES_ID", num_args = 0..=1, default_missing_value = crate::data::fred::SERIES_FEDFUNDS)]
    pub fred: Option<String>,

    /// Latest observation date requested from FRED (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub fred_end: Option<String>,

    /// Use generated demo data for both series.
    #[arg(long, conflicts_with_all = ["fed", "ecb", "fred"])]
    pub demo: bool,

    /// Random seed for demo data.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for `rates show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Date to highlight (repeatable, up to 4 are used).
    #[arg(short, long = "date", value_name = "YYYY-MM-DD")]
    pub dates: Vec<String>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `rates export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Date to include (repeatable, up to 4 are used).
    #[arg(short, long = "date", value_name = "YYYY-MM-DD")]
    pub dates: Vec<String>,

    /// Write the comparison table as CSV.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Write series, selection and comparison as JSON.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

/// Options for `rates tui`.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Dates selected when the TUI opens (repeatable).
    #[arg(short, long = "date", value_name = "YYYY-MM-DD")]
    pub dates: Vec<String>,
}

impl SourceArgs {
    /// Build the run configuration, prompting for missing CSV paths.
    pub fn to_config(&self, requested_dates: Vec<NaiveDate>) -> Result<DashboardConfig, AppError> {
        self.to_config_with(requested_dates, picker::prompt_for_csv_path)
    }

    /// Same as [`SourceArgs::to_config`] with an injectable prompt.
    pub fn to_config_with<F>(&self, requested_dates: Vec<NaiveDate>, mut prompt: F) -> Result<DashboardConfig, AppError>
    where
        F: FnMut(&str) -> Result<PathBuf, AppError>,
    {
        let fed_id = SeriesId::new(&self.fed_label);
        let ecb_id = SeriesId::new(&self.ecb_label);
        if fed_id.as_str().is_empty() || ecb_id.as_str().is_empty() {
            return Err(AppError::new(2, "Series labels must not be empty."));
        }
        if fed_id == ecb_id {
            return Err(AppError::new(
                2,
                format!("Both series are labelled `{fed_id}`; pass distinct --fed-label/--ecb-label."),
            ));
        }

        let observation_end = self
            .fred_end
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|e| AppError::new(2, format!("Invalid --fred-end '{s}': {e}")))
            })
            .transpose()?;

        let sources = if self.demo {
            vec![
                SourceSpec {
                    id: fed_id,
                    kind: SourceKind::Demo,
                },
                SourceSpec {
                    id: ecb_id,
                    kind: SourceKind::Demo,
                },
            ]
        } else {
            let fed_kind = match (&self.fred, &self.fed) {
                (Some(series_id), _) => SourceKind::Fred {
                    series_id: series_id.clone(),
                },
                (None, Some(path)) => SourceKind::Csv {
                    path: picker::validate_csv_path(path)?,
                    column: self.fed_column.clone(),
                },
                (None, None) => SourceKind::Csv {
                    path: prompt(fed_id.as_str())?,
                    column: self.fed_column.clone(),
                },
            };
            let ecb_path = match &self.ecb {
                Some(path) => picker::validate_csv_path(path)?,
                None => prompt(ecb_id.as_str())?,
            };
            vec![
                SourceSpec {
                    id: fed_id,
                    kind: fed_kind,
                },
                SourceSpec {
                    id: ecb_id,
                    kind: SourceKind::Csv {
                        path: ecb_path,
                        column: self.ecb_column.clone(),
                    },
                },
            ]
        };

        Ok(DashboardConfig {
            sources,
            requested_dates,
            seed: self.seed,
            observation_end,
            ..DashboardConfig::default()
        })
    }
}
