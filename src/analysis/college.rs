//! Program retention statistics per college.

use super::stats::{mean, median, round_to};
use crate::models::{CollegeProgramStats, ProgramRetentionSummary};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct CollegeAccumulator<'a> {
    programs: BTreeSet<&'a str>,
    rates: Vec<f64>,
    max_streak: Option<u32>,
}

/// Aggregate program retention by college.
///
/// Rows without a retention rate are ignored, so a college whose programs
/// all lack one does not appear. Output is sorted by college.
pub fn college_program_retention_stats(
    summaries: &[ProgramRetentionSummary],
) -> Vec<CollegeProgramStats> {
    let mut grouped: BTreeMap<&str, CollegeAccumulator> = BTreeMap::new();

    for summary in summaries {
        let Some(rate) = summary.retention_rate else {
            continue;
        };

        let acc = grouped.entry(summary.college.as_str()).or_default();
        acc.programs.insert(summary.program.as_str());
        acc.rates.push(rate);
        acc.max_streak = acc.max_streak.max(summary.longest_streak);
    }

    grouped
        .into_iter()
        .filter_map(|(college, acc)| {
            let avg = mean(&acc.rates)?;
            let mid = median(&acc.rates)?;
            let full = acc.rates.iter().filter(|r| **r == 1.0).count();

            Some(CollegeProgramStats {
                college: college.to_string(),
                num_programs: acc.programs.len(),
                avg_retention: round_to(avg, 3),
                median_retention: round_to(mid, 3),
                pct_full_retention: round_to(full as f64 / acc.rates.len() as f64 * 100.0, 1),
                max_streak: acc.max_streak,
            })
        })
        .collect()
}
