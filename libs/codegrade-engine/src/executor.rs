/// Test Executor - one test case, end to end
///
/// 1. Decode input and expected output text
/// 2. Invoke the entry point through the execution engine
/// 3. Race the invocation against the per-test budget
/// 4. Classify the outcome via the evaluator
///
/// Every failure ends up inside the returned `TestResult`; nothing propagates.
use crate::engine::{ExecutionEngine, Invocation, InvocationFailure};
use crate::evaluator;
use crate::value::{decode, Value};
use codegrade_common::types::{TestCase, TestResult, TestStatus};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub async fn execute_test(
    engine: &dyn ExecutionEngine,
    source: &str,
    entry_point: &str,
    test_case: &TestCase,
    timeout: Duration,
) -> TestResult {
    let argument = decode(&test_case.input);
    let expected = decode(&test_case.expected_output).unwrap_or(Value::Undefined);

    let invocation = Invocation {
        source,
        entry_point,
        argument: argument.as_ref(),
    };

    let start = Instant::now();

    // The losing invocation is dropped, never awaited again
    let outcome = match tokio::time::timeout(timeout, engine.invoke(invocation)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(InvocationFailure::TimedOut(timeout)),
    };

    let execution_time_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        Err(InvocationFailure::TimedOut(budget)) => warn!(
            test_id = %test_case.id,
            timeout_ms = budget.as_millis() as u64,
            "Test execution timed out"
        ),
        Err(failure) => debug!(test_id = %test_case.id, error = %failure, "Invocation failed"),
        Ok(_) => {}
    }

    let result = evaluator::evaluate_test(test_case, &expected, outcome, execution_time_ms);

    debug!(
        test_id = %result.id,
        status = ?result.status,
        execution_ms = execution_time_ms,
        "Test graded"
    );
    if result.status == TestStatus::Fail {
        debug!(
            test_id = %result.id,
            expected = %test_case.expected_output,
            actual = result.actual_output_display.as_deref().unwrap_or(""),
            "Output mismatch"
        );
    }

    result
}
