//! Session state: the current selection over a shared dataset snapshot.
//!
//! A session never mutates the dataset. Every change of selection is
//! followed by a full recomputation in [`Session::dashboard`].

use crate::analysis;
use crate::error::FilterError;
use crate::filter::{self, Selection};
use crate::models::{Dashboard, DashboardMetadata, Dataset, RawTables};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Options that shape the computed dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Cohort for the detail view; the earliest cohort when unset.
    pub cohort: Option<i32>,
    /// Echo the loaded tables in the dashboard.
    pub include_raw: bool,
}

/// One user's view of a dataset.
pub struct Session {
    dataset: Arc<Dataset>,
    selection: Selection,
}

impl Session {
    /// Start a session with no filters.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            selection: Selection::all(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select a college; `None` or "All" clears it.
    ///
    /// The program selection survives only if the new college offers it.
    pub fn select_college(&mut self, college: Option<&str>) -> Result<(), FilterError> {
        let program = self.selection.program().map(str::to_string);
        let cleared = Selection::new(&self.dataset, college, None)?;

        self.selection = match program {
            Some(ref p) => match Selection::new(&self.dataset, college, Some(p)) {
                Ok(selection) => selection,
                Err(_) => {
                    debug!("Program '{}' not offered by new college, clearing it", p);
                    cleared
                }
            },
            None => cleared,
        };
        Ok(())
    }

    /// Select a program within the current college; `None` or "All" clears it.
    pub fn select_program(&mut self, program: Option<&str>) -> Result<(), FilterError> {
        self.selection = Selection::new(&self.dataset, self.selection.college(), program)?;
        Ok(())
    }

    /// Colleges the user can pick from.
    pub fn college_options(&self) -> Vec<String> {
        filter::college_options(&self.dataset)
    }

    /// Programs the user can pick from, given the selected college.
    pub fn program_options(&self) -> Vec<String> {
        filter::program_options(&self.dataset, self.selection.college())
    }

    /// Compute every table for the current selection.
    pub fn dashboard(&self, options: &DashboardOptions) -> Dashboard {
        let dataset = self.dataset.as_ref();
        let view = self.selection.apply(dataset);
        // Entry rates ignore the program selector.
        let college_view = self.selection.college_scope().apply(dataset);

        let cohorts = analysis::build_cohort_table(&view.participation, &view.program_retention);
        let selected_cohort = options
            .cohort
            .or_else(|| analysis::cohort_labels(&cohorts).first().copied());
        let cohort_detail = selected_cohort.and_then(|c| {
            let detail = analysis::cohort_detail(&cohorts, c);
            if detail.is_none() {
                warn!("Cohort {} has no rows for the current selection", c);
            }
            detail
        });

        let raw = options.include_raw.then(|| RawTables {
            participation: dataset.participation.clone(),
            program_retention: dataset.program_retention.clone(),
            college_retention: dataset.college_retention.clone(),
            yoy_retention: dataset.yoy_retention.clone(),
        });

        Dashboard {
            metadata: DashboardMetadata {
                source: dataset.source.clone(),
                generated_at: Utc::now(),
                college_filter: self.selection.college().map(str::to_string),
                program_filter: self.selection.program().map(str::to_string),
                malformed_rows: dataset.malformed.len(),
            },
            overview: analysis::overview(dataset),
            program_retention: analysis::rank_programs(&view.program_retention),
            college_stats: analysis::college_program_retention_stats(&view.program_retention),
            college_retention: dataset.college_retention.clone(),
            heatmap: analysis::participation_matrix(&view.participation),
            cohorts,
            cohort_detail,
            entries: analysis::build_new_entry_table(
                &college_view.program_retention,
                &college_view.participation,
            ),
            dropouts: analysis::build_dropout_table(&view.program_retention),
            yoy_retention: dataset.yoy_retention.clone(),
            malformed: dataset.malformed.clone(),
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticipationRecord, ProgramRetentionSummary};

    fn dataset() -> Arc<Dataset> {
        let mut participation = Vec::new();
        for (program, years) in [("A", vec![2019, 2020, 2021]), ("B", vec![2019])] {
            for year in 2019..=2021 {
                participation.push(ParticipationRecord {
                    college: "X".to_string(),
                    program: program.to_string(),
                    year,
                    participated: years.contains(&year),
                });
            }
        }
        participation.push(ParticipationRecord {
            college: "Y".to_string(),
            program: "C".to_string(),
            year: 2020,
            participated: true,
        });

        let summary = |college: &str, program: &str, rate: f64, first: i32, last: i32| {
            ProgramRetentionSummary {
                college: college.to_string(),
                program: program.to_string(),
                retention_rate: Some(rate),
                longest_streak: Some(1),
                first_year: Some(first),
                last_year: Some(last),
            }
        };

        Arc::new(Dataset {
            source: "memory".to_string(),
            participation,
            program_retention: vec![
                summary("X", "A", 1.0, 2019, 2021),
                summary("X", "B", 0.0, 2019, 2019),
                summary("Y", "C", 1.0, 2020, 2020),
            ],
            ..Dataset::default()
        })
    }

    #[test]
    fn test_dashboard_unfiltered() {
        let session = Session::new(dataset());
        let dashboard = session.dashboard(&DashboardOptions::default());

        assert_eq!(dashboard.metadata.college_filter, None);
        assert_eq!(dashboard.overview.total_programs, 3);
        assert_eq!(dashboard.college_stats.len(), 2);
        assert_eq!(dashboard.cohort_detail.as_ref().map(|d| d.cohort), Some(2019));
        assert_eq!(dashboard.dropouts.by_year.len(), 3);
        assert!(dashboard.raw.is_none());
    }

    #[test]
    fn test_dashboard_filtered_by_college() {
        let mut session = Session::new(dataset());
        session.select_college(Some("X")).unwrap();

        let dashboard = session.dashboard(&DashboardOptions {
            cohort: Some(2019),
            include_raw: true,
        });

        assert_eq!(dashboard.metadata.college_filter.as_deref(), Some("X"));
        assert_eq!(dashboard.college_stats.len(), 1);
        assert_eq!(dashboard.heatmap.rows.len(), 2);
        let rates: Vec<f64> = dashboard.cohorts.iter().map(|r| r.retention_rate).collect();
        assert_eq!(rates, vec![1.0, 0.5, 0.5]);
        assert_eq!(dashboard.raw.map(|r| r.participation.len()), Some(7));
        // overview always describes the whole dataset
        assert_eq!(dashboard.overview.total_colleges, 2);
    }

    #[test]
    fn test_changing_college_keeps_program_consistent() {
        let mut session = Session::new(dataset());
        session.select_college(Some("X")).unwrap();
        session.select_program(Some("A")).unwrap();
        assert_eq!(session.program_options(), vec!["A", "B"]);

        session.select_college(Some("Y")).unwrap();
        assert_eq!(session.selection().program(), None);
        assert_eq!(session.program_options(), vec!["C"]);

        assert!(session.select_program(Some("A")).is_err());
        assert!(session.select_college(Some("Z")).is_err());
        assert_eq!(session.selection().college(), Some("Y"));
    }

    #[test]
    fn test_entry_rate_bounded_under_program_filter() {
        let fixtures =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/retention");
        let dataset = crate::loader::DatasetLoader::default().load(&fixtures).unwrap();

        let mut session = Session::new(dataset);
        session.select_college(Some("Engineering")).unwrap();
        let college_entries = session.dashboard(&DashboardOptions::default()).entries;

        session.select_program(Some("Civil Engineering")).unwrap();
        let dashboard = session.dashboard(&DashboardOptions::default());

        assert!(!dashboard.entries.is_empty());
        for row in &dashboard.entries {
            if let Some(rate) = row.entry_rate {
                assert!(rate <= 1.0, "entry rate {} above 1 in {}", rate, row.year);
            }
        }
        assert_eq!(dashboard.entries, college_entries);
        // the heatmap still follows the program selector
        assert_eq!(dashboard.heatmap.rows.len(), 1);
    }

    #[test]
    fn test_unknown_cohort_has_no_detail() {
        let session = Session::new(dataset());
        let dashboard = session.dashboard(&DashboardOptions {
            cohort: Some(1999),
            include_raw: false,
        });
        assert!(dashboard.cohort_detail.is_none());
        assert!(!dashboard.cohorts.is_empty());
    }
}
