//! College and program selection.
//!
//! Picking a college narrows both the participation and the program
//! retention tables; picking a program narrows the participation table
//! only. Program options are always drawn from the selected college, and
//! [`Selection::new`] rejects any combination outside of them.

use crate::error::FilterError;
use crate::models::{Dataset, ParticipationRecord, ProgramRetentionSummary};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Selector value meaning "no filter".
pub const ALL: &str = "All";

/// Colleges offered by the college selector, sorted.
pub fn college_options(dataset: &Dataset) -> Vec<String> {
    dataset
        .program_retention
        .iter()
        .map(|s| s.college.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Programs offered by the program selector for a college, sorted.
pub fn program_options(dataset: &Dataset, college: Option<&str>) -> Vec<String> {
    dataset
        .program_retention
        .iter()
        .filter(|s| college.map_or(true, |c| s.college == c))
        .map(|s| s.program.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A validated (college, program) selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    college: Option<String>,
    program: Option<String>,
}

impl Selection {
    /// The selection with no filters.
    pub fn all() -> Self {
        Self::default()
    }

    /// Validate a selection against the dataset.
    ///
    /// `None`, an empty value or "All" (any case) leave that selector open.
    pub fn new(
        dataset: &Dataset,
        college: Option<&str>,
        program: Option<&str>,
    ) -> Result<Self, FilterError> {
        let college = normalize(college);
        let program = normalize(program);

        if let Some(ref c) = college {
            if !college_options(dataset).contains(c) {
                return Err(FilterError::UnknownCollege(c.clone()));
            }
        }

        if let Some(ref p) = program {
            if !program_options(dataset, college.as_deref()).contains(p) {
                let scope = match college {
                    Some(ref c) => format!("college '{}'", c),
                    None => "any college".to_string(),
                };
                return Err(FilterError::UnknownProgram {
                    program: p.clone(),
                    scope,
                });
            }
        }

        Ok(Self { college, program })
    }

    pub fn college(&self) -> Option<&str> {
        self.college.as_deref()
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Label of the college selector as shown to the user.
    pub fn college_label(&self) -> &str {
        self.college().unwrap_or(ALL)
    }

    /// Label of the program selector as shown to the user.
    pub fn program_label(&self) -> &str {
        self.program().unwrap_or(ALL)
    }

    /// The same selection with the program selector left open.
    pub fn college_scope(&self) -> Self {
        Self {
            college: self.college.clone(),
            program: None,
        }
    }

    /// Restrict the dataset to this selection without touching it.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        if self.college.is_none() && self.program.is_none() {
            return FilteredView {
                participation: Cow::Borrowed(&dataset.participation),
                program_retention: Cow::Borrowed(&dataset.program_retention),
            };
        }

        let college = self.college();
        let program = self.program();

        let participation = dataset
            .participation
            .iter()
            .filter(|r| college.map_or(true, |c| r.college == c))
            .filter(|r| program.map_or(true, |p| r.program == p))
            .cloned()
            .collect();

        let program_retention = dataset
            .program_retention
            .iter()
            .filter(|s| college.map_or(true, |c| s.college == c))
            .cloned()
            .collect();

        FilteredView {
            participation: Cow::Owned(participation),
            program_retention: Cow::Owned(program_retention),
        }
    }
}

/// The rows that pass a selection.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub participation: Cow<'a, [ParticipationRecord]>,
    pub program_retention: Cow<'a, [ProgramRetentionSummary]>,
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
        .map(str::to_string)
}
