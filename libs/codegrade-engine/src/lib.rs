//! Code-submission grading engine.
//!
//! [`Grader`] resolves a submission's entry point, runs it once per test
//! case through an [`ExecutionEngine`], and returns one result per case.

pub mod comparator;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod formatter;
pub mod grader;
pub mod resolver;
pub mod value;

#[cfg(test)]
mod test_support;

pub use engine::{ExecutionEngine, Invocation, InvocationFailure, NodeEngine};
pub use error::GradeError;
pub use grader::Grader;
pub use value::Value;
