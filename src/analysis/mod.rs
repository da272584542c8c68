//! Aggregations over the loaded tables.
//!
//! Every function here is pure: it borrows its input rows and returns a
//! freshly built table, so running it twice on the same input yields the
//! same output.

pub mod cohort;
pub mod college;
pub mod dropout;
pub mod entry;
pub mod overview;
pub mod stats;

pub use cohort::{build_cohort_table, cohort_detail, cohort_labels};
pub use college::college_program_retention_stats;
pub use dropout::build_dropout_table;
pub use entry::build_new_entry_table;
pub use overview::{overview, participation_matrix, rank_programs};
