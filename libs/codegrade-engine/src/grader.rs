/// Grading Engine - High-Level Orchestration
///
/// **Responsibility:**
/// Grade a whole submission against a whole test suite.
///
/// **Flow:**
/// 1. Resolve the entry point once; if that fails, every test case gets the
///    same `Error` result and nothing executes
/// 2. Run the test executor for each case, strictly in order
/// 3. Return a report with exactly one result per case
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (engine's job)
/// - How outcomes are classified (evaluator's job)
use crate::engine::{ExecutionEngine, NodeEngine};
use crate::error::GradeError;
use crate::executor::execute_test;
use crate::resolver::resolve_entry_point;
use codegrade_common::config::GraderConfig;
use codegrade_common::types::{GradingReport, GradingRequest, Language, TestCase, TestResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const ENTRY_POINT_NOT_FOUND_MESSAGE: &str =
    "Could not identify the function to test. Declare it as `function name(input) { ... }`.";

#[derive(Clone)]
pub struct Grader {
    engine: Arc<dyn ExecutionEngine>,
    default_timeout: Duration,
}

impl Grader {
    pub fn new(engine: Arc<dyn ExecutionEngine>, default_timeout: Duration) -> Self {
        Self {
            engine,
            default_timeout,
        }
    }

    /// Production grader backed by the Node.js engine.
    pub fn from_config(config: &GraderConfig) -> Self {
        Self::new(
            Arc::new(NodeEngine::new(config.clone())),
            Duration::from_millis(config.default_timeout_ms),
        )
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// A missing or zero budget means the configured default.
    fn budget(&self, timeout_ms: Option<u64>) -> Duration {
        match timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => self.default_timeout,
        }
    }

    /// Grade `source` against `test_cases`. Never fails: every problem is
    /// reported per test case.
    #[instrument(
        skip(self, source, test_cases),
        fields(run_id = %uuid::Uuid::new_v4(), test_count = test_cases.len())
    )]
    pub async fn grade(&self, source: &str, test_cases: &[TestCase], timeout_ms: Option<u64>) -> GradingReport {
        let timeout = self.budget(timeout_ms);

        let entry_point = match resolve_entry_point(source) {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Entry point not identified; all tests marked as errors");
                return test_cases
                    .iter()
                    .map(|tc| TestResult::errored(tc, ENTRY_POINT_NOT_FOUND_MESSAGE, 0))
                    .collect::<Vec<_>>()
                    .into();
            }
        };

        info!(
            entry_point = %entry_point,
            timeout_ms = timeout.as_millis() as u64,
            source_size = source.len(),
            "Grading submission"
        );

        let mut report = GradingReport::with_capacity(test_cases.len());
        for (idx, test_case) in test_cases.iter().enumerate() {
            debug!(test_num = idx + 1, test_id = %test_case.id, "Executing test");
            let result = execute_test(self.engine.as_ref(), source, &entry_point, test_case, timeout).await;
            report.push(result);
        }

        let summary = report.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            "Grading complete"
        );

        report
    }

    /// Validate the submission language, then grade.
    pub async fn grade_submission(&self, request: &GradingRequest) -> Result<GradingReport, GradeError> {
        let language = Language::parse(&request.language)
            .ok_or_else(|| GradeError::UnsupportedLanguage(request.language.clone()))?;

        debug!(language = %language, "Submission language accepted");

        Ok(self
            .grade(&request.source_code, &request.test_cases, request.timeout_ms)
            .await)
    }
}
