// src/engine/mod.rs

//! Per-participant randomization and grading.
//!
//! A canonical quiz is turned into a participant's view by the permutation
//! step, the view is remembered by the session's view cache, and a later
//! submission in display coordinates is reconciled back to canonical
//! coordinates and graded.

pub mod grading;
pub mod permutation;
pub mod reconcile;
pub mod session;
pub mod view_cache;

use thiserror::Error;

pub use grading::{GradeReport, GradedResult, grade};
pub use permutation::{CoordinateMapping, build_view};
pub use reconcile::{display_answers, reconcile};
pub use session::{ActiveSession, Submission};
pub use view_cache::{ParticipantView, ViewCache};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no quiz session is active")]
    NoActiveSession,

    /// A cached mapping points outside the canonical quiz. Never expected.
    #[error(
        "display question {display_index} maps to canonical index {canonical_index}, outside 0..{canonical_count}"
    )]
    InvalidMapping {
        display_index: usize,
        canonical_index: usize,
        canonical_count: usize,
    },

    #[error("view shows {displayed} questions but its mapping covers {mapped}")]
    MappingLength { displayed: usize, mapped: usize },

    #[error("display question {display_index} repeats canonical index {canonical_index}")]
    DuplicateMapping {
        display_index: usize,
        canonical_index: usize,
    },

    #[error("display question {display_index} maps option {label} to an unknown canonical option")]
    UnknownOption { display_index: usize, label: String },
}
