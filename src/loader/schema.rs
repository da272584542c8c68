//! Conversion of raw tables into typed rows.
//!
//! Missing required columns fail the whole table. Individual rows that lack
//! a key they cannot exist without are skipped and reported as
//! [`MalformedRow`]s; optional fields that cannot be read load as `None`.

use super::table::{Cell, RawTable};
use crate::error::LoadError;
use crate::models::{
    CollegeRetentionSummary, MalformedRow, ParticipationRecord, ProgramRetentionSummary,
    TableKind, YoyRetentionSummary,
};
use tracing::debug;

/// Rows parsed from one table plus the rows that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub malformed: Vec<MalformedRow>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            malformed: Vec::new(),
        }
    }
}

impl<T> Parsed<T> {
    fn skip(&mut self, table: TableKind, row: usize, reason: impl Into<String>) {
        let malformed = MalformedRow {
            table,
            row,
            reason: reason.into(),
        };
        debug!("Skipping {}", malformed);
        self.malformed.push(malformed);
    }
}

/// Parse the per-year participation table.
pub fn parse_participation(table: &RawTable) -> Result<Parsed<ParticipationRecord>, LoadError> {
    let college_col = table.column("College")?;
    let program_col = table.column("Program")?;
    let year_col = table.column("Year")?;
    let participated_col = table.column("Participated")?;

    let mut parsed = Parsed::default();
    for (line, record) in table.records() {
        let Some(college) = record.get(college_col).as_text() else {
            parsed.skip(TableKind::Participation, line, "missing College");
            continue;
        };
        let Some(program) = record.get(program_col).as_text() else {
            parsed.skip(TableKind::Participation, line, "missing Program");
            continue;
        };
        let Some(year) = record.get(year_col).as_year() else {
            parsed.skip(TableKind::Participation, line, "missing or non-integer Year");
            continue;
        };
        let Some(participated) = record.get(participated_col).as_flag() else {
            parsed.skip(TableKind::Participation, line, "Participated is not 0 or 1");
            continue;
        };

        parsed.rows.push(ParticipationRecord {
            college,
            program,
            year,
            participated,
        });
    }

    Ok(parsed)
}

/// Parse the per-program retention summary table.
pub fn parse_program_retention(
    table: &RawTable,
) -> Result<Parsed<ProgramRetentionSummary>, LoadError> {
    let college_col = table.column("College")?;
    let program_col = table.column("Program")?;
    let retention_rate_col = table.column("retention_rate")?;
    let longest_streak_col = table.column("longest_streak")?;
    let first_year_col = table.column("first_year")?;
    let last_year_col = table.column("last_year")?;

    let mut parsed = Parsed::default();
    for (line, record) in table.records() {
        let Some(college) = record.get(college_col).as_text() else {
            parsed.skip(TableKind::ProgramRetention, line, "missing College");
            continue;
        };
        let Some(program) = record.get(program_col).as_text() else {
            parsed.skip(TableKind::ProgramRetention, line, "missing Program");
            continue;
        };

        parsed.rows.push(ProgramRetentionSummary {
            college,
            program,
            retention_rate: rate(record.get(retention_rate_col)),
            longest_streak: record
                .get(longest_streak_col)
                .as_integer()
                .and_then(|v| u32::try_from(v).ok()),
            first_year: record.get(first_year_col).as_year(),
            last_year: record.get(last_year_col).as_year_lossy(),
        });
    }

    Ok(parsed)
}

/// Parse the per-college retention summary table.
pub fn parse_college_retention(
    table: &RawTable,
) -> Result<Parsed<CollegeRetentionSummary>, LoadError> {
    let college_col = table.column("College")?;
    let retention_rate_col = table.column("retention_rate")?;

    let mut parsed = Parsed::default();
    for (line, record) in table.records() {
        let Some(college) = record.get(college_col).as_text() else {
            parsed.skip(TableKind::CollegeRetention, line, "missing College");
            continue;
        };
        let Some(retention_rate) = rate(record.get(retention_rate_col)) else {
            parsed.skip(TableKind::CollegeRetention, line, "missing or invalid retention_rate");
            continue;
        };

        parsed.rows.push(CollegeRetentionSummary {
            college,
            retention_rate,
        });
    }

    Ok(parsed)
}

/// Parse the year-over-year retention table.
pub fn parse_yoy_retention(table: &RawTable) -> Result<Parsed<YoyRetentionSummary>, LoadError> {
    let from_year_col = table.column("from_year")?;
    let retention_rate_col = table.column("retention_rate")?;

    let mut parsed = Parsed::default();
    for (line, record) in table.records() {
        let Some(from_year) = record.get(from_year_col).as_year() else {
            parsed.skip(TableKind::YoyRetention, line, "missing or non-integer from_year");
            continue;
        };
        let Some(retention_rate) = rate(record.get(retention_rate_col)) else {
            parsed.skip(TableKind::YoyRetention, line, "missing or invalid retention_rate");
            continue;
        };

        parsed.rows.push(YoyRetentionSummary {
            from_year,
            retention_rate,
        });
    }

    Ok(parsed)
}

/// A rate cell, only when it lies in [0, 1].
fn rate(cell: &Cell) -> Option<f64> {
    cell.as_f64().filter(|r| (0.0..=1.0).contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn table(name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_parse_participation() {
        let raw = table(
            "Program-Year Participation",
            &["College", "Program", "Year", "Participated"],
            vec![
                vec![text("Arts"), text("History"), Cell::Float(2019.0), Cell::Int(1)],
                vec![text("Arts"), text("History"), Cell::Int(2020), Cell::Int(0)],
                vec![text("Arts"), Cell::Empty, Cell::Int(2020), Cell::Int(1)],
                vec![text("Arts"), text("Music"), text("soon"), Cell::Int(1)],
                vec![text("Arts"), text("Music"), Cell::Int(2021), Cell::Int(3)],
            ],
        );

        let parsed = parse_participation(&raw).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].year, 2019);
        assert!(parsed.rows[0].participated);
        assert!(!parsed.rows[1].participated);

        let lines: Vec<usize> = parsed.malformed.iter().map(|m| m.row).collect();
        assert_eq!(lines, vec![4, 5, 6]);
        assert!(parsed
            .malformed
            .iter()
            .all(|m| m.table == TableKind::Participation));
    }

    #[test]
    fn test_parse_participation_missing_column() {
        let raw = table(
            "Program-Year Participation",
            &["College", "Program", "year", "Participated"],
            Vec::new(),
        );

        let err = parse_participation(&raw).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "Year", .. }));
    }

    #[test]
    fn test_parse_program_retention_optional_fields() {
        let raw = table(
            "Program Retention",
            &[
                "College",
                "Program",
                "retention_rate",
                "longest_streak",
                "first_year",
                "last_year",
            ],
            vec![
                vec![
                    text("Science"),
                    text("Physics"),
                    Cell::Float(0.75),
                    Cell::Float(3.0),
                    Cell::Float(2018.0),
                    Cell::Float(2022.0),
                ],
                vec![
                    text("Science"),
                    text("Chemistry"),
                    Cell::Empty,
                    Cell::Int(-1),
                    Cell::Float(2018.5),
                    Cell::Empty,
                ],
                vec![
                    text("Science"),
                    text("Biology"),
                    Cell::Float(1.5),
                    Cell::Empty,
                    Cell::Empty,
                    Cell::Empty,
                ],
                vec![Cell::Empty, text("Orphan")],
            ],
        );

        let parsed = parse_program_retention(&raw).unwrap();

        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.malformed.len(), 1);

        let physics = &parsed.rows[0];
        assert_eq!(physics.retention_rate, Some(0.75));
        assert_eq!(physics.longest_streak, Some(3));
        assert_eq!(physics.first_year, Some(2018));
        assert_eq!(physics.last_year, Some(2022));

        let chemistry = &parsed.rows[1];
        assert_eq!(chemistry.retention_rate, None);
        assert_eq!(chemistry.longest_streak, None);
        assert_eq!(chemistry.first_year, None);

        assert_eq!(parsed.rows[2].retention_rate, None);
    }

    #[test]
    fn test_fractional_last_year_still_counts_as_dropout() {
        let raw = table(
            "Program Retention",
            &[
                "College",
                "Program",
                "retention_rate",
                "longest_streak",
                "first_year",
                "last_year",
            ],
            vec![vec![
                text("Arts"),
                text("Music"),
                Cell::Float(0.5),
                Cell::Int(2),
                Cell::Float(2019.5),
                Cell::Float(2021.5),
            ]],
        );

        let parsed = parse_program_retention(&raw).unwrap();
        assert_eq!(parsed.rows[0].first_year, None);
        assert_eq!(parsed.rows[0].last_year, Some(2021));

        let tables = crate::analysis::build_dropout_table(&parsed.rows);
        assert_eq!(
            tables.by_year,
            vec![crate::models::DropoutRow {
                last_year: 2021,
                programs_dropped: 1
            }]
        );
        assert_eq!(tables.by_college[0].college, "Arts");
    }

    #[test]
    fn test_parse_summary_tables() {
        let colleges = table(
            "College Retention",
            &["College", "retention_rate"],
            vec![
                vec![text("Arts"), text("0.8")],
                vec![text("Law"), Cell::Empty],
            ],
        );
        let parsed = parse_college_retention(&colleges).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.malformed.len(), 1);

        let yoy = table(
            "YoY Program Retention",
            &["from_year", "retention_rate"],
            vec![
                vec![Cell::Int(2019), Cell::Float(0.9)],
                vec![Cell::Int(2020), Cell::Float(0.85)],
            ],
        );
        let parsed = parse_yoy_retention(&yoy).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].from_year, 2020);
        assert!(parsed.malformed.is_empty());
    }
}
