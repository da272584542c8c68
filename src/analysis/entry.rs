//! New program entry per year.

use super::stats::{ratio, round_to};
use crate::models::{EntryRow, ParticipationRecord, ProgramRetentionSummary};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Count new programs per first year and relate them to the programs active
/// that year.
///
/// Years come from the summaries' `first_year` values. `active_programs`
/// counts distinct program names participating that year and is absent when
/// nothing was recorded, in which case `entry_rate` is absent too.
pub fn build_new_entry_table(
    summaries: &[ProgramRetentionSummary],
    participation: &[ParticipationRecord],
) -> Vec<EntryRow> {
    let mut new_programs: BTreeMap<i32, usize> = BTreeMap::new();
    for first_year in summaries.iter().filter_map(|s| s.first_year) {
        *new_programs.entry(first_year).or_default() += 1;
    }

    let mut active: HashMap<i32, BTreeSet<&str>> = HashMap::new();
    for record in participation.iter().filter(|r| r.participated) {
        active
            .entry(record.year)
            .or_default()
            .insert(record.program.as_str());
    }

    new_programs
        .into_iter()
        .map(|(year, new_programs)| {
            let active_programs = active.get(&year).map(BTreeSet::len);
            let entry_rate = active_programs
                .and_then(|active| ratio(new_programs, active))
                .map(|rate| round_to(rate, 3));

            EntryRow {
                year,
                new_programs,
                active_programs,
                entry_rate,
            }
        })
        .collect()
}
