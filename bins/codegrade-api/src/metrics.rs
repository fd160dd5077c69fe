// Prometheus metrics for grading traffic

use codegrade_common::types::GradingReport;
use lazy_static::lazy_static;
use prometheus::{register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref GRADING_REQUESTS: IntCounter = register_int_counter!(
        "codegrade_grading_requests_total",
        "Grading requests received"
    )
    .unwrap();
    pub static ref REJECTED_SUBMISSIONS: IntCounter = register_int_counter!(
        "codegrade_rejected_submissions_total",
        "Submissions rejected before grading (unsupported language)"
    )
    .unwrap();
    pub static ref TEST_RESULTS: IntCounterVec = register_int_counter_vec!(
        "codegrade_test_results_total",
        "Graded test cases by status",
        &["status"]
    )
    .unwrap();
    pub static ref GRADING_DURATION: Histogram = register_histogram!(
        "codegrade_grading_duration_seconds",
        "Wall-clock time to grade one submission"
    )
    .unwrap();
}

pub fn record_report(report: &GradingReport) {
    for result in report {
        TEST_RESULTS.with_label_values(&[&result.status.to_string()]).inc();
    }
}
