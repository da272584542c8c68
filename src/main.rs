//! CohortScope - retention analytics for program participation workbooks
//!
//! A CLI tool that loads the participation and retention tables of a
//! workbook (or a directory of CSV exports), applies a college/program
//! selection and renders retention, cohort survival, new entry and
//! drop-off tables as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing data, bad selection, unreadable config, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod filter;
mod loader;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use loader::{DatasetLoader, TableNames};
use session::{DashboardOptions, Session};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("CohortScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .cohortscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the data source, sheet names, filters and views.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `--verbose`/`--quiet` when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the data, apply the selection and write the report.
fn run(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the dataset
    let mut loader = DatasetLoader::new(TableNames::from(&config.source));
    let dataset = loader
        .load(&config.source.path)
        .with_context(|| format!("Failed to load {}", config.source.path.display()))?;

    // Step 2: Apply the selection
    let mut session = Session::new(dataset);
    session
        .select_college(config.filter.college.as_deref())
        .context("Invalid college selection")?;
    session
        .select_program(config.filter.program.as_deref())
        .context("Invalid program selection")?;

    info!(
        "Selection: College = {}, Program = {}",
        session.selection().college_label(),
        session.selection().program_label()
    );

    if args.list_options {
        print_options(&session);
        return Ok(());
    }

    // Step 3: Compute the dashboard
    let options = DashboardOptions {
        cohort: args.cohort,
        include_raw: config.report.wants_raw(),
    };
    let dashboard = session.dashboard(&options);

    let mut views = config.report.views.clone();
    if config.report.include_raw && !views.contains(&cli::View::Raw) {
        views.push(cli::View::Raw);
    }

    // Step 4: Render and write the report
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard, &views),
    };

    match config.report.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;

            let data = session.dataset();
            println!("\n📊 Dashboard Summary:");
            println!("   Source: {}", data.source);
            println!(
                "   Programs: {} | Colleges: {} | Years: {}",
                dashboard.overview.total_programs,
                dashboard.overview.total_colleges,
                dashboard.overview.years_label()
            );
            println!("   Cohorts: {}", analysis::cohort_labels(&dashboard.cohorts).len());
            if !data.malformed.is_empty() {
                println!("   ⚠️  Skipped rows: {}", data.malformed.len());
            }
            println!("\n✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Handle --list-options: print what the selectors accept.
fn print_options(session: &Session) {
    println!("Colleges:");
    println!("  {}", filter::ALL);
    for college in session.college_options() {
        println!("  {}", college);
    }

    println!("\nPrograms ({}):", session.selection().college_label());
    println!("  {}", filter::ALL);
    for program in session.program_options() {
        println!("  {}", program);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
