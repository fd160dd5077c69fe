use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the grader can execute.
///
/// Only one scripting dialect is supported; every other name is rejected
/// before grading starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
}

impl Language {
    /// Parse a user-supplied language name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::JavaScript => write!(f, "javascript"),
        }
    }
}

/// One grading unit supplied by the lesson content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub input: String,
    #[serde(alias = "expectedOutput")]
    pub expected_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            expected_output: expected_output.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "pass"),
            TestStatus::Fail => write!(f, "fail"),
            TestStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of grading one test case.
///
/// `error` is set exactly when `status` is `Fail` or `Error`, and
/// `actual_output_display` is only absent for `Error` results that never
/// produced a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub status: TestStatus,
    pub input_display: String,
    pub expected_output_display: String,
    pub actual_output_display: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl TestResult {
    /// Build an `Error` result that never produced a value.
    pub fn errored(test_case: &TestCase, message: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            id: test_case.id.clone(),
            status: TestStatus::Error,
            input_display: test_case.input.clone(),
            expected_output_display: test_case.expected_output.clone(),
            actual_output_display: None,
            error: Some(message.into()),
            execution_time_ms,
        }
    }
}

/// Ordered results of a grading run, one per submitted test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradingReport {
    results: Vec<TestResult>,
}

impl GradingReport {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestResult> {
        self.results.iter()
    }

    pub fn summary(&self) -> GradingSummary {
        GradingSummary::from_results(&self.results)
    }
}

impl From<Vec<TestResult>> for GradingReport {
    fn from(results: Vec<TestResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a GradingReport {
    type Item = &'a TestResult;
    type IntoIter = std::slice::Iter<'a, TestResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Aggregate pass/fail counts, as forwarded to progress tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub all_passed: bool,
}

impl GradingSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = GradingSummary {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match result.status {
                TestStatus::Pass => summary.passed += 1,
                TestStatus::Fail => summary.failed += 1,
                TestStatus::Error => summary.errored += 1,
            }
        }

        // An empty suite proves nothing
        summary.all_passed = summary.total > 0 && summary.passed == summary.total;
        summary
    }
}

/// Envelope accepted by the CLI and HTTP surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingRequest {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(alias = "sourceCode")]
    pub source_code: String,
    #[serde(alias = "testCases")]
    pub test_cases: Vec<TestCase>,
    #[serde(default, alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
}

fn default_language() -> String {
    Language::JavaScript.to_string()
}
