//! Program drop-off by last active year.

use crate::models::{CollegeDropoutRow, DropoutRow, DropoutTables, ProgramRetentionSummary};
use std::collections::BTreeMap;

/// Count programs by their last active year, overall and per college.
///
/// Summaries without a `last_year` are ignored.
pub fn build_dropout_table(summaries: &[ProgramRetentionSummary]) -> DropoutTables {
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    let mut by_college: BTreeMap<(i32, &str), usize> = BTreeMap::new();

    for summary in summaries {
        let Some(last_year) = summary.last_year else {
            continue;
        };

        *by_year.entry(last_year).or_default() += 1;
        *by_college
            .entry((last_year, summary.college.as_str()))
            .or_default() += 1;
    }

    DropoutTables {
        by_year: by_year
            .into_iter()
            .map(|(last_year, programs_dropped)| DropoutRow {
                last_year,
                programs_dropped,
            })
            .collect(),
        by_college: by_college
            .into_iter()
            .map(|((last_year, college), programs_dropped)| CollegeDropoutRow {
                last_year,
                college: college.to_string(),
                programs_dropped,
            })
            .collect(),
    }
}
