/// Test Evaluator - Outcome Classification
///
/// **Core Responsibility:**
/// Turn the outcome of one invocation into a terminal `TestResult`.
///
/// **Critical Properties:**
/// - Knows nothing about how the routine was executed
/// - Pure function: (test case, expected value, invocation outcome) → result
///
/// **Classification Rules:**
/// - Invocation failed (threw, timed out, engine failure) → `Error`, no actual output
/// - Returned a value unequal to the expected value → `Fail`, actual output shown
/// - Returned an equal value → `Pass`
use crate::comparator::values_equal;
use crate::engine::InvocationFailure;
use crate::formatter::format_value;
use crate::value::Value;
use codegrade_common::types::{GradingReport, GradingSummary, TestCase, TestResult, TestStatus};

pub const MISMATCH_MESSAGE: &str = "Output did not match the expected result";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error while running submission";

/// Classify a single invocation outcome.
pub fn evaluate_test(
    test_case: &TestCase,
    expected: &Value,
    outcome: Result<Value, InvocationFailure>,
    execution_time_ms: u64,
) -> TestResult {
    let actual = match outcome {
        Ok(actual) => actual,
        Err(failure) => {
            let message = failure.to_string();
            let message = if message.trim().is_empty() {
                UNKNOWN_ERROR_MESSAGE.to_string()
            } else {
                message
            };
            return TestResult::errored(test_case, message, execution_time_ms);
        }
    };

    let (status, error) = if values_equal(&actual, expected) {
        (TestStatus::Pass, None)
    } else {
        (TestStatus::Fail, Some(MISMATCH_MESSAGE.to_string()))
    };

    TestResult {
        id: test_case.id.clone(),
        status,
        input_display: test_case.input.clone(),
        expected_output_display: test_case.expected_output.clone(),
        actual_output_display: Some(format_value(&actual)),
        error,
        execution_time_ms,
    }
}

/// Aggregate pass/fail counts for a finished report.
pub fn summarize(report: &GradingReport) -> GradingSummary {
    report.summary()
}
