//! Errors that fail a grading call as a whole.
//!
//! Everything else that can go wrong while grading (no entry point, a
//! routine that throws or hangs, a wrong answer) is reported inside the
//! `GradingReport` instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("Unsupported submission language '{0}': only javascript submissions can be graded")]
    UnsupportedLanguage(String),
}
