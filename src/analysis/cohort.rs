//! Cohort survival: programs grouped by their first active year.

use super::stats::{ratio, round_to};
use crate::models::{CohortDetail, CohortRow, ParticipationRecord, ProgramRetentionSummary};
use std::collections::{BTreeMap, BTreeSet, HashMap};

type ProgramKey<'a> = (&'a str, &'a str);

#[derive(Default)]
struct CohortAccumulator<'a> {
    /// Every program seen participating in the cohort, any year.
    programs: BTreeSet<ProgramKey<'a>>,
    /// Programs participating, per year.
    by_year: BTreeMap<i32, BTreeSet<ProgramKey<'a>>>,
}

/// Build the cohort survival table.
///
/// Each program is labelled with its `first_year` from the summaries;
/// programs without one are left out. A cohort's `total_programs` counts
/// the programs ever seen participating in it, and each observed year gets
/// the share of those programs participating that year. Rows are ordered
/// by cohort, then year.
pub fn build_cohort_table(
    participation: &[ParticipationRecord],
    summaries: &[ProgramRetentionSummary],
) -> Vec<CohortRow> {
    let mut labels: HashMap<ProgramKey, BTreeSet<i32>> = HashMap::new();
    for summary in summaries {
        if let Some(first_year) = summary.first_year {
            labels
                .entry((summary.college.as_str(), summary.program.as_str()))
                .or_default()
                .insert(first_year);
        }
    }

    let mut cohorts: BTreeMap<i32, CohortAccumulator> = BTreeMap::new();
    for record in participation.iter().filter(|r| r.participated) {
        let key = (record.college.as_str(), record.program.as_str());
        let Some(cohort_labels) = labels.get(&key) else {
            continue;
        };

        for cohort in cohort_labels {
            let acc = cohorts.entry(*cohort).or_default();
            acc.programs.insert(key);
            acc.by_year.entry(record.year).or_default().insert(key);
        }
    }

    let mut rows = Vec::new();
    for (cohort, acc) in cohorts {
        let total_programs = acc.programs.len();
        for (year, active) in acc.by_year {
            let active_programs = active.len();
            let rate = ratio(active_programs, total_programs).unwrap_or(0.0);
            rows.push(CohortRow {
                cohort,
                year,
                total_programs,
                active_programs,
                retention_rate: round_to(rate, 3),
            });
        }
    }

    rows
}

/// Distinct cohorts in a cohort table, ascending.
pub fn cohort_labels(rows: &[CohortRow]) -> Vec<i32> {
    rows.iter()
        .map(|r| r.cohort)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows of a single cohort; `None` when the cohort was never observed.
pub fn cohort_detail(rows: &[CohortRow], cohort: i32) -> Option<CohortDetail> {
    let selected: Vec<CohortRow> = rows
        .iter()
        .filter(|r| r.cohort == cohort)
        .cloned()
        .collect();
    (!selected.is_empty()).then_some(CohortDetail {
        cohort,
        rows: selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(college: &str, program: &str, year: i32, participated: bool) -> ParticipationRecord {
        ParticipationRecord {
            college: college.to_string(),
            program: program.to_string(),
            year,
            participated,
        }
    }

    fn summary(college: &str, program: &str, first_year: Option<i32>) -> ProgramRetentionSummary {
        ProgramRetentionSummary {
            college: college.to_string(),
            program: program.to_string(),
            retention_rate: Some(1.0),
            longest_streak: Some(1),
            first_year,
            last_year: None,
        }
    }

    fn scenario() -> (Vec<ParticipationRecord>, Vec<ProgramRetentionSummary>) {
        let participation = vec![
            record("X", "A", 2019, true),
            record("X", "A", 2020, true),
            record("X", "A", 2021, true),
            record("X", "B", 2019, true),
            record("X", "B", 2020, false),
            record("X", "B", 2021, false),
        ];
        let summaries = vec![summary("X", "A", Some(2019)), summary("X", "B", Some(2019))];
        (participation, summaries)
    }

    #[test]
    fn test_cohort_scenario() {
        let (participation, summaries) = scenario();

        let rows = build_cohort_table(&participation, &summaries);

        let observed: Vec<(i32, i32, usize, usize, f64)> = rows
            .iter()
            .map(|r| (r.cohort, r.year, r.active_programs, r.total_programs, r.retention_rate))
            .collect();
        assert_eq!(
            observed,
            vec![
                (2019, 2019, 2, 2, 1.0),
                (2019, 2020, 1, 2, 0.5),
                (2019, 2021, 1, 2, 0.5),
            ]
        );
    }

    #[test]
    fn test_programs_without_first_year_are_dropped() {
        let participation = vec![record("X", "A", 2020, true), record("Y", "C", 2020, true)];
        let summaries = vec![summary("X", "A", Some(2020)), summary("Y", "C", None)];

        let rows = build_cohort_table(&participation, &summaries);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_programs, 1);
    }

    #[test]
    fn test_join_is_on_college_and_program() {
        let participation = vec![record("X", "A", 2020, true), record("Y", "A", 2020, true)];
        let summaries = vec![summary("X", "A", Some(2020))];

        let rows = build_cohort_table(&participation, &summaries);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].active_programs, 1);
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        assert!(build_cohort_table(&[], &[]).is_empty());

        let participation = vec![record("X", "A", 2020, false)];
        let summaries = vec![summary("X", "A", Some(2020))];
        assert!(build_cohort_table(&participation, &summaries).is_empty());
    }

    #[test]
    fn test_cohort_years_strictly_increase() {
        let participation = vec![
            record("X", "A", 2021, true),
            record("X", "A", 2019, true),
            record("X", "A", 2019, true),
            record("X", "B", 2020, true),
            record("X", "C", 2022, true),
        ];
        let summaries = vec![
            summary("X", "A", Some(2019)),
            summary("X", "B", Some(2020)),
            summary("X", "C", Some(2019)),
        ];

        let rows = build_cohort_table(&participation, &summaries);

        for pair in rows.windows(2) {
            if pair[0].cohort == pair[1].cohort {
                assert!(pair[0].year < pair[1].year);
            } else {
                assert!(pair[0].cohort < pair[1].cohort);
            }
        }
        for row in &rows {
            assert!((0.0..=1.0).contains(&row.retention_rate));
            assert!(row.active_programs <= row.total_programs);
        }
        assert_eq!(rows, build_cohort_table(&participation, &summaries));
    }

    #[test]
    fn test_cohort_detail_and_labels() {
        let (participation, summaries) = scenario();
        let rows = build_cohort_table(&participation, &summaries);

        assert_eq!(cohort_labels(&rows), vec![2019]);

        let detail = cohort_detail(&rows, 2019).unwrap();
        assert_eq!(detail.rows.len(), 3);
        assert!(cohort_detail(&rows, 2022).is_none());
    }
}
