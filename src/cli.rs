//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CohortScope - retention analytics for program participation workbooks
///
/// Loads a participation workbook (or a directory of CSV exports) and
/// renders retention, cohort survival, entry and drop-off tables as a
/// Markdown or JSON report.
///
/// Examples:
///   cohortscope --data 3MT_retention_analysis.xlsx
///   cohortscope --data exports/ --college Engineering --view cohort,entry
///   cohortscope --college Arts --program Music --format json -o arts.json
///   cohortscope --college Arts --list-options
///   cohortscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Workbook (.xlsx, .xlsm, .xlsb, .xls, .ods) or directory of CSV files
    ///
    /// A CSV directory holds one `<sheet name>.csv` file per table.
    /// Defaults to the path in .cohortscope.toml, then 3MT_retention_analysis.xlsx.
    #[arg(short, long, value_name = "PATH", env = "COHORTSCOPE_DATA")]
    pub data: Option<PathBuf>,

    /// College to filter by ("All" for every college)
    #[arg(long, value_name = "NAME")]
    pub college: Option<String>,

    /// Program to filter by, within the selected college ("All" for every program)
    #[arg(long, value_name = "NAME")]
    pub program: Option<String>,

    /// Cohort (first participation year) shown in the cohort detail table
    ///
    /// Defaults to the earliest cohort.
    #[arg(long, value_name = "YEAR")]
    pub cohort: Option<i32>,

    /// Views to render (comma-separated)
    ///
    /// Example: --view overview,cohort,dropout
    #[arg(long, value_name = "VIEWS", value_delimiter = ',')]
    pub view: Option<Vec<View>>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cohortscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the college and program options for the selection and exit
    #[arg(long)]
    pub list_options: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cohortscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// A dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Totals, average retention per college and YoY retention
    Overview,
    /// Program retention ranking
    Program,
    /// College statistics and college retention
    College,
    /// Program × year participation grid
    Heatmap,
    /// Cohort survival
    Cohort,
    /// New program entry per year
    Entry,
    /// Drop-off by last active year
    Dropout,
    /// Year-over-year retention
    Yoy,
    /// Loaded tables
    Raw,
}

impl View {
    /// Views rendered when none are requested.
    pub fn dashboard_tabs() -> &'static [View] {
        &[
            View::Overview,
            View::Program,
            View::College,
            View::Heatmap,
            View::Cohort,
            View::Entry,
            View::Dropout,
            View::Yoy,
        ]
    }

    /// Section title of the view.
    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Program => "Program Retention",
            View::College => "College Retention",
            View::Heatmap => "Streak Heatmap",
            View::Cohort => "Cohort Survival",
            View::Entry => "New Program Entry",
            View::Dropout => "Drop-Off Analysis",
            View::Yoy => "YoY Retention",
            View::Raw => "Raw Data",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref views) = self.view {
            if views.is_empty() {
                return Err("At least one view must be given to --view".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data source does not exist: {}", data.display()));
            }
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
