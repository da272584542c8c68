//! Markdown and JSON report generation.
//!
//! This module renders a computed [`Dashboard`] as one Markdown section per
//! requested view, or as a single JSON document.

use crate::cli::View;
use crate::models::{
    CohortRow, CollegeProgramStats, Dashboard, DashboardMetadata, MalformedRow,
    ParticipationRecord, ProgramRetentionSummary, YoyRetentionSummary,
};
use anyhow::Result;

/// Placeholder for missing values.
const MISSING: &str = "—";

/// Generate a complete Markdown report for the given views.
pub fn generate_markdown_report(dashboard: &Dashboard, views: &[View]) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# 3MT Retention Analysis\n\n");

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(views));

    for view in views {
        output.push_str(&format!("## {}\n\n", view.title()));
        let section = match view {
            View::Overview => generate_overview_section(dashboard),
            View::Program => generate_program_section(dashboard),
            View::College => generate_college_section(dashboard),
            View::Heatmap => generate_heatmap_section(dashboard),
            View::Cohort => generate_cohort_section(dashboard),
            View::Entry => generate_entry_section(dashboard),
            View::Dropout => generate_dropout_section(dashboard),
            View::Yoy => yoy_table(&dashboard.yoy_retention),
            View::Raw => generate_raw_section(dashboard),
        };
        output.push_str(&section);
    }

    output.push_str(&generate_data_quality_section(&dashboard.malformed));
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **College:** {}\n",
        metadata.college_filter.as_deref().unwrap_or("All")
    ));
    section.push_str(&format!(
        "- **Program:** {}\n",
        metadata.program_filter.as_deref().unwrap_or("All")
    ));
    if metadata.malformed_rows > 0 {
        section.push_str(&format!("- **Skipped Rows:** {}\n", metadata.malformed_rows));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(views: &[View]) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for view in views {
        let anchor = view.title().to_lowercase().replace(' ', "-");
        toc.push_str(&format!("- [{}](#{})\n", view.title(), anchor));
    }
    toc.push('\n');

    toc
}

/// High-level snapshot, average retention per college and YoY retention.
fn generate_overview_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();
    let overview = &dashboard.overview;

    section.push_str("| Total Programs | Total Colleges | Years Covered |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        overview.total_programs,
        overview.total_colleges,
        overview.years_label()
    ));

    section.push_str("### Average Program Retention by College\n\n");
    section.push_str(&markdown_table(
        &["College", "avg_retention"],
        dashboard
            .college_stats
            .iter()
            .map(|s| vec![s.college.clone(), fmt_rate(s.avg_retention)])
            .collect(),
    ));

    section.push_str("### YoY Program Retention\n\n");
    section.push_str(&yoy_table(&dashboard.yoy_retention));

    section
}

/// Program summaries, best retention first.
fn generate_program_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "Filtered by College: **{}**, Program: **{}**\n\n",
        dashboard.metadata.college_filter.as_deref().unwrap_or("All"),
        dashboard.metadata.program_filter.as_deref().unwrap_or("All")
    ));
    section.push_str(&program_table(&dashboard.program_retention));

    section
}

/// College statistics and the loaded college retention table.
fn generate_college_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str(&college_stats_table(&dashboard.college_stats));

    section.push_str("### College Participation Retention (Any Program Present)\n\n");
    section.push_str(&markdown_table(
        &["College", "retention_rate"],
        dashboard
            .college_retention
            .iter()
            .map(|c| vec![c.college.clone(), fmt_rate(c.retention_rate)])
            .collect(),
    ));

    section
}

/// Program × year grid, 1 where the program participated.
fn generate_heatmap_section(dashboard: &Dashboard) -> String {
    let heatmap = &dashboard.heatmap;
    if heatmap.is_empty() {
        return "_No data for the current filter selection._\n\n".to_string();
    }

    let mut headers = vec!["Program".to_string()];
    headers.extend(heatmap.years.iter().map(|y| y.to_string()));
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();

    let rows = heatmap
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.program.clone()];
            cells.extend(row.cells.iter().map(|c| c.to_string()));
            cells
        })
        .collect();

    markdown_table(&headers, rows)
}

/// Detail of the selected cohort followed by every cohort row.
fn generate_cohort_section(dashboard: &Dashboard) -> String {
    if dashboard.cohorts.is_empty() {
        return "_No cohort data available._\n\n".to_string();
    }

    let mut section = String::new();

    if let Some(ref detail) = dashboard.cohort_detail {
        section.push_str(&format!("### Cohort {}: Retention Over Time\n\n", detail.cohort));
        section.push_str(&cohort_table(&detail.rows));
    }

    section.push_str("### All Cohort Summary\n\n");
    section.push_str(&cohort_table(&dashboard.cohorts));

    section
}

/// New programs per year and their share of active programs.
fn generate_entry_section(dashboard: &Dashboard) -> String {
    if dashboard.entries.is_empty() {
        return "_No entry data available._\n\n".to_string();
    }

    markdown_table(
        &["Year", "new_programs", "active_programs", "entry_rate"],
        dashboard
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.year.to_string(),
                    e.new_programs.to_string(),
                    fmt_opt(e.active_programs),
                    e.entry_rate.map(fmt_rate).unwrap_or_else(|| MISSING.to_string()),
                ]
            })
            .collect(),
    )
}

/// Programs dropping out per last active year, overall and per college.
fn generate_dropout_section(dashboard: &Dashboard) -> String {
    let dropouts = &dashboard.dropouts;
    if dropouts.by_year.is_empty() {
        return "_No drop-off data available._\n\n".to_string();
    }

    let mut section = markdown_table(
        &["last_year", "programs_dropped"],
        dropouts
            .by_year
            .iter()
            .map(|d| vec![d.last_year.to_string(), d.programs_dropped.to_string()])
            .collect(),
    );

    section.push_str("### Drop-Off by College & Year\n\n");
    section.push_str(&markdown_table(
        &["last_year", "College", "programs_dropped"],
        dropouts
            .by_college
            .iter()
            .map(|d| {
                vec![
                    d.last_year.to_string(),
                    d.college.clone(),
                    d.programs_dropped.to_string(),
                ]
            })
            .collect(),
    ));

    section
}

/// The loaded tables as they were read.
fn generate_raw_section(dashboard: &Dashboard) -> String {
    let Some(ref raw) = dashboard.raw else {
        return "_Raw tables were not included._\n\n".to_string();
    };

    let mut section = String::new();

    section.push_str("### Program-Year Participation\n\n");
    section.push_str(&participation_table(&raw.participation));

    section.push_str("### Program Retention\n\n");
    section.push_str(&program_table(&raw.program_retention));

    section.push_str("### College Retention\n\n");
    section.push_str(&markdown_table(
        &["College", "retention_rate"],
        raw.college_retention
            .iter()
            .map(|c| vec![c.college.clone(), fmt_rate(c.retention_rate)])
            .collect(),
    ));

    section.push_str("### YoY Program Retention\n\n");
    section.push_str(&yoy_table(&raw.yoy_retention));

    section
}

/// List rows skipped while loading.
fn generate_data_quality_section(malformed: &[MalformedRow]) -> String {
    if malformed.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str(&format!(
        "{} source rows were skipped while loading:\n\n",
        malformed.len()
    ));
    for row in malformed {
        section.push_str(&format!("- {}\n", row));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by CohortScope v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn program_table(rows: &[ProgramRetentionSummary]) -> String {
    markdown_table(
        &[
            "College",
            "Program",
            "retention_rate",
            "longest_streak",
            "first_year",
            "last_year",
        ],
        rows.iter()
            .map(|p| {
                vec![
                    p.college.clone(),
                    p.program.clone(),
                    p.retention_rate.map(fmt_rate).unwrap_or_else(|| MISSING.to_string()),
                    fmt_opt(p.longest_streak),
                    fmt_opt(p.first_year),
                    fmt_opt(p.last_year),
                ]
            })
            .collect(),
    )
}

fn college_stats_table(rows: &[CollegeProgramStats]) -> String {
    markdown_table(
        &[
            "College",
            "num_programs",
            "avg_retention",
            "median_retention",
            "pct_full_retention",
            "max_streak",
        ],
        rows.iter()
            .map(|s| {
                vec![
                    s.college.clone(),
                    s.num_programs.to_string(),
                    fmt_rate(s.avg_retention),
                    fmt_rate(s.median_retention),
                    format!("{:.1}", s.pct_full_retention),
                    fmt_opt(s.max_streak),
                ]
            })
            .collect(),
    )
}

fn cohort_table(rows: &[CohortRow]) -> String {
    markdown_table(
        &[
            "cohort",
            "year",
            "total_programs",
            "active_programs",
            "retention_rate",
        ],
        rows.iter()
            .map(|r| {
                vec![
                    r.cohort.to_string(),
                    r.year.to_string(),
                    r.total_programs.to_string(),
                    r.active_programs.to_string(),
                    fmt_rate(r.retention_rate),
                ]
            })
            .collect(),
    )
}

fn participation_table(rows: &[ParticipationRecord]) -> String {
    markdown_table(
        &["College", "Program", "Year", "Participated"],
        rows.iter()
            .map(|r| {
                vec![
                    r.college.clone(),
                    r.program.clone(),
                    r.year.to_string(),
                    u8::from(r.participated).to_string(),
                ]
            })
            .collect(),
    )
}

fn yoy_table(rows: &[YoyRetentionSummary]) -> String {
    markdown_table(
        &["from_year", "retention_rate"],
        rows.iter()
            .map(|y| vec![y.from_year.to_string(), fmt_rate(y.retention_rate)])
            .collect(),
    )
}

/// Render a Markdown table; an empty body renders a note instead.
fn markdown_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "_No rows._\n\n".to_string();
    }

    let mut table = String::new();

    table.push_str(&format!("| {} |\n", headers.join(" | ")));
    table.push_str(&format!("|{}\n", ":---|".repeat(headers.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        table.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    table.push('\n');

    table
}

fn fmt_rate(rate: f64) -> String {
    format!("{:.3}", rate)
}

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}
