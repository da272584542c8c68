//! Snapshot numbers, the participation heatmap and the program ranking.

use crate::models::{
    Dataset, MatrixRow, Overview, ParticipationMatrix, ParticipationRecord,
    ProgramRetentionSummary,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Distinct programs and colleges, and the span of participation years.
pub fn overview(dataset: &Dataset) -> Overview {
    let programs: BTreeSet<&str> = dataset
        .program_retention
        .iter()
        .map(|s| s.program.as_str())
        .collect();
    let colleges: BTreeSet<&str> = dataset
        .program_retention
        .iter()
        .map(|s| s.college.as_str())
        .collect();

    let years = dataset.participation.iter().map(|r| r.year);
    let years_covered = years.clone().min().zip(years.max());

    Overview {
        total_programs: programs.len(),
        total_colleges: colleges.len(),
        years_covered,
    }
}

/// Pivot participation into a program × year grid.
///
/// A cell is 1 when any record of the program participated that year and 0
/// otherwise, including years the program has no record for.
pub fn participation_matrix(participation: &[ParticipationRecord]) -> ParticipationMatrix {
    let years: BTreeSet<i32> = participation.iter().map(|r| r.year).collect();
    let years: Vec<i32> = years.into_iter().collect();

    let mut grid: BTreeMap<&str, BTreeMap<i32, u8>> = BTreeMap::new();
    for record in participation {
        let cell = grid
            .entry(record.program.as_str())
            .or_default()
            .entry(record.year)
            .or_default();
        *cell = (*cell).max(u8::from(record.participated));
    }

    let rows = grid
        .into_iter()
        .map(|(program, cells)| MatrixRow {
            program: program.to_string(),
            cells: years
                .iter()
                .map(|year| cells.get(year).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    ParticipationMatrix { years, rows }
}

/// Program summaries ordered by retention rate, highest first.
///
/// Programs without a rate go last; ties keep their input order.
pub fn rank_programs(summaries: &[ProgramRetentionSummary]) -> Vec<ProgramRetentionSummary> {
    let mut ranked = summaries.to_vec();
    ranked.sort_by(|a, b| match (a.retention_rate, b.retention_rate) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked
}
