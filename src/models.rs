//! Data models for the retention analytics.
//!
//! This module contains the typed rows loaded from the participation
//! workbook, the derived tables produced by the aggregators, and the
//! `Dashboard` handed to the report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a program took part in a given year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    /// College offering the program.
    #[serde(rename = "College")]
    pub college: String,
    /// Program name (unique within its college).
    #[serde(rename = "Program")]
    pub program: String,
    /// Calendar year of the event.
    #[serde(rename = "Year")]
    pub year: i32,
    /// True when the program participated that year.
    #[serde(rename = "Participated", with = "participated_flag")]
    pub participated: bool,
}

/// Retention summary of a single program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRetentionSummary {
    #[serde(rename = "College")]
    pub college: String,
    #[serde(rename = "Program")]
    pub program: String,
    /// Share of years the program returned, in [0, 1].
    pub retention_rate: Option<f64>,
    /// Longest consecutive run of participating years.
    pub longest_streak: Option<u32>,
    /// First year with recorded activity.
    pub first_year: Option<i32>,
    /// Last year with recorded activity.
    pub last_year: Option<i32>,
}

/// Retention summary of a college (any program present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeRetentionSummary {
    #[serde(rename = "College")]
    pub college: String,
    pub retention_rate: f64,
}

/// Share of programs active in `from_year` that are also active the year after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyRetentionSummary {
    pub from_year: i32,
    pub retention_rate: f64,
}

/// Loaded table a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Participation,
    ProgramRetention,
    CollegeRetention,
    YoyRetention,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Participation => write!(f, "participation"),
            TableKind::ProgramRetention => write!(f, "program retention"),
            TableKind::CollegeRetention => write!(f, "college retention"),
            TableKind::YoyRetention => write!(f, "YoY retention"),
        }
    }
}

/// A source row skipped at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRow {
    pub table: TableKind,
    /// Row number as shown in the sheet (header is row 1).
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for MalformedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}: {}", self.table, self.row, self.reason)
    }
}

/// Immutable snapshot of the four loaded tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable name of the source (path).
    pub source: String,
    pub participation: Vec<ParticipationRecord>,
    pub program_retention: Vec<ProgramRetentionSummary>,
    pub college_retention: Vec<CollegeRetentionSummary>,
    pub yoy_retention: Vec<YoyRetentionSummary>,
    /// Rows dropped while loading.
    pub malformed: Vec<MalformedRow>,
}

/// Program retention statistics of one college.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeProgramStats {
    #[serde(rename = "College")]
    pub college: String,
    pub num_programs: usize,
    pub avg_retention: f64,
    pub median_retention: f64,
    /// Percentage (0-100) of programs with a retention rate of exactly 1.
    pub pct_full_retention: f64,
    pub max_streak: Option<u32>,
}

/// Survival of one cohort in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    /// First year of the cohort's programs.
    pub cohort: i32,
    pub year: i32,
    pub total_programs: usize,
    pub active_programs: usize,
    pub retention_rate: f64,
}

/// New programs entering in a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    #[serde(rename = "Year")]
    pub year: i32,
    pub new_programs: usize,
    /// Distinct programs participating that year, absent if none were recorded.
    pub active_programs: Option<usize>,
    /// `new_programs / active_programs`, absent when the ratio is undefined.
    pub entry_rate: Option<f64>,
}

/// Programs whose last active year is `last_year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropoutRow {
    pub last_year: i32,
    pub programs_dropped: usize,
}

/// Dropout counts broken down by college.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollegeDropoutRow {
    pub last_year: i32,
    #[serde(rename = "College")]
    pub college: String,
    pub programs_dropped: usize,
}

/// Both dropout frequency tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropoutTables {
    pub by_year: Vec<DropoutRow>,
    pub by_college: Vec<CollegeDropoutRow>,
}

/// High-level snapshot numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub total_programs: usize,
    pub total_colleges: usize,
    /// Earliest and latest participation year, absent for an empty table.
    pub years_covered: Option<(i32, i32)>,
}

impl Overview {
    /// Returns the year span as displayed in the report.
    pub fn years_label(&self) -> String {
        match self.years_covered {
            Some((first, last)) => format!("{}–{}", first, last),
            None => "n/a".to_string(),
        }
    }
}

/// Program × year participation pivot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationMatrix {
    /// Column labels, ascending.
    pub years: Vec<i32>,
    /// One row per program, sorted by program name.
    pub rows: Vec<MatrixRow>,
}

impl ParticipationMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Participation flags of a program, aligned with `ParticipationMatrix::years`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub program: String,
    pub cells: Vec<u8>,
}

/// Survival rows of the cohort picked for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortDetail {
    pub cohort: i32,
    pub rows: Vec<CohortRow>,
}

/// The loaded tables, echoed for the raw data view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTables {
    pub participation: Vec<ParticipationRecord>,
    pub program_retention: Vec<ProgramRetentionSummary>,
    pub college_retention: Vec<CollegeRetentionSummary>,
    pub yoy_retention: Vec<YoyRetentionSummary>,
}

/// Metadata about a rendered dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    /// Data source the dashboard was computed from.
    pub source: String,
    /// When the dashboard was computed.
    pub generated_at: DateTime<Utc>,
    /// Selected college, `None` for all colleges.
    pub college_filter: Option<String>,
    /// Selected program, `None` for all programs.
    pub program_filter: Option<String>,
    /// Rows skipped while loading.
    pub malformed_rows: usize,
}

/// Every table the presentation layer renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub overview: Overview,
    pub program_retention: Vec<ProgramRetentionSummary>,
    pub college_stats: Vec<CollegeProgramStats>,
    pub college_retention: Vec<CollegeRetentionSummary>,
    pub heatmap: ParticipationMatrix,
    pub cohorts: Vec<CohortRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_detail: Option<CohortDetail>,
    pub entries: Vec<EntryRow>,
    pub dropouts: DropoutTables,
    pub yoy_retention: Vec<YoyRetentionSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<MalformedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawTables>,
}

/// Serializes the participation flag as the 0/1 integer used by the sheets.
mod participated_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        match raw {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "Participated must be 0 or 1, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participation_serializes_flag_as_integer() {
        let record = ParticipationRecord {
            college: "Engineering".to_string(),
            program: "Civil".to_string(),
            year: 2021,
            participated: true,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"Participated\":1"));
        assert!(json.contains("\"College\":\"Engineering\""));

        let back: ParticipationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_participation_rejects_other_flags() {
        let json = r#"{"College":"A","Program":"B","Year":2020,"Participated":2}"#;
        assert!(serde_json::from_str::<ParticipationRecord>(json).is_err());
    }

    #[test]
    fn test_overview_years_label() {
        let overview = Overview {
            total_programs: 3,
            total_colleges: 1,
            years_covered: Some((2018, 2023)),
        };
        assert_eq!(overview.years_label(), "2018–2023");

        let empty = Overview {
            years_covered: None,
            ..overview
        };
        assert_eq!(empty.years_label(), "n/a");
    }

    #[test]
    fn test_malformed_row_display() {
        let row = MalformedRow {
            table: TableKind::Participation,
            row: 7,
            reason: "missing Year".to_string(),
        };
        assert_eq!(row.to_string(), "participation row 7: missing Year");
    }
}
