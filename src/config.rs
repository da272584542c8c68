//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cohortscope.toml` files.

use crate::cli::{OutputFormat, View};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".cohortscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Default filter selection.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the data lives and what its tables are called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Workbook file or directory of CSV files.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Sheet holding per-year participation records.
    #[serde(default = "default_participation_table")]
    pub participation_table: String,

    /// Sheet holding per-program retention summaries.
    #[serde(default = "default_program_retention_table")]
    pub program_retention_table: String,

    /// Sheet holding per-college retention summaries.
    #[serde(default = "default_college_retention_table")]
    pub college_retention_table: String,

    /// Sheet holding year-over-year retention.
    #[serde(default = "default_yoy_retention_table")]
    pub yoy_retention_table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            participation_table: default_participation_table(),
            program_retention_table: default_program_retention_table(),
            college_retention_table: default_college_retention_table(),
            yoy_retention_table: default_yoy_retention_table(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("3MT_retention_analysis.xlsx")
}

fn default_participation_table() -> String {
    "Program-Year Participation".to_string()
}

fn default_program_retention_table() -> String {
    "Program Retention".to_string()
}

fn default_college_retention_table() -> String {
    "College Retention".to_string()
}

fn default_yoy_retention_table() -> String {
    "YoY Program Retention".to_string()
}

/// Filter applied when no selector is given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// College to select ("All" or unset for every college).
    #[serde(default)]
    pub college: Option<String>,

    /// Program to select within the college.
    #[serde(default)]
    pub program: Option<String>,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file; stdout when unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Views to render, in order.
    #[serde(default = "default_views")]
    pub views: Vec<View>,

    /// Echo the loaded tables in the report.
    #[serde(default)]
    pub include_raw: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            views: default_views(),
            include_raw: false,
        }
    }
}

impl ReportConfig {
    /// Whether the loaded tables should be echoed.
    pub fn wants_raw(&self) -> bool {
        self.include_raw || self.views.contains(&View::Raw)
    }
}

fn default_views() -> Vec<View> {
    View::dashboard_tabs().to_vec()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.source.path = data.clone();
        }

        // A college on the command line replaces the configured pair
        if args.college.is_some() {
            self.filter.college = args.college.clone();
            self.filter.program = None;
        }
        if args.program.is_some() {
            self.filter.program = args.program.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.clone());
        }
        if let Some(ref views) = args.view {
            self.report.views = views.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
