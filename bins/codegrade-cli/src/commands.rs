// CLI commands for grading submissions
use anyhow::{bail, Context, Result};
use codegrade_common::config::{GraderConfig, DEFAULT_CONFIG_PATH};
use codegrade_common::types::{GradingReport, GradingRequest, TestCase, TestResult, TestStatus};
use codegrade_engine::resolver::resolve_entry_point;
use codegrade_engine::Grader;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Accepted layouts for a test suite file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TestSuiteFile {
    Cases(Vec<TestCase>),
    Wrapped {
        #[serde(alias = "testCases")]
        test_cases: Vec<TestCase>,
    },
}

impl TestSuiteFile {
    fn into_cases(self) -> Vec<TestCase> {
        match self {
            TestSuiteFile::Cases(cases) => cases,
            TestSuiteFile::Wrapped { test_cases } => test_cases,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<GraderConfig> {
    match path {
        Some(path) => GraderConfig::load(path)?.with_env_overrides(),
        None => GraderConfig::load_default(),
    }
}

fn load_test_suite(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test suite {}", path.display()))?;
    parse_test_suite(&content).with_context(|| format!("Failed to parse test suite {}", path.display()))
}

fn parse_test_suite(content: &str) -> Result<Vec<TestCase>> {
    let suite: TestSuiteFile = serde_json::from_str(content)?;
    let cases = suite.into_cases();

    let mut seen = std::collections::HashSet::new();
    for case in &cases {
        if !seen.insert(case.id.as_str()) {
            bail!("Duplicate test case id '{}'", case.id);
        }
    }

    Ok(cases)
}

/// Grade a submission file. Returns whether every test passed.
pub async fn grade(
    config: &GraderConfig,
    source_path: &Path,
    tests_path: &Path,
    language: &str,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<bool> {
    let source_code = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source {}", source_path.display()))?;
    let test_cases = load_test_suite(tests_path)?;

    let request = GradingRequest {
        language: language.to_string(),
        source_code,
        test_cases,
        timeout_ms,
    };

    let grader = Grader::from_config(config);
    let report = grader.grade_submission(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report.summary().all_passed)
}

fn print_report(report: &GradingReport) {
    println!("→ Graded {} test cases", report.len());
    println!();

    for (idx, result) in report.iter().enumerate() {
        println!("  Test {} (id: {}) → {:?} [{}ms]", idx + 1, result.id, result.status, result.execution_time_ms);
        print_details(result);
    }

    let summary = report.summary();
    println!();
    println!("→ Summary");
    println!("  Passed:  {} / {}", summary.passed, summary.total);
    println!("  Failed:  {}", summary.failed);
    println!("  Errors:  {}", summary.errored);
}

fn print_details(result: &TestResult) {
    match result.status {
        TestStatus::Pass => println!("    ✓ Output matched"),
        TestStatus::Fail => {
            println!("    ✗ {}", result.error.as_deref().unwrap_or("Output mismatch"));
            println!("    Input:    {}", result.input_display);
            println!("    Expected: {}", result.expected_output_display);
            println!("    Got:      {}", result.actual_output_display.as_deref().unwrap_or(""));
        }
        TestStatus::Error => {
            println!("    ✗ Error: {}", result.error.as_deref().unwrap_or(""));
        }
    }
}

/// Print the entry point a submission would be graded through.
pub fn resolve(source_path: &Path) -> Result<()> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source {}", source_path.display()))?;

    let entry_point = resolve_entry_point(&source)
        .with_context(|| format!("No gradable function in {}", source_path.display()))?;

    println!("{}", entry_point);
    Ok(())
}

/// Write config/grader.json with default settings under `path`.
pub fn init_project(path: &Path, force: bool) -> Result<()> {
    let config_path = path.join(DEFAULT_CONFIG_PATH);

    if config_path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", config_path.display());
    }

    GraderConfig::default().save(&config_path)?;

    println!("✓ Wrote {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let cases = parse_test_suite(r#"[{"id":"t1","input":"[2,3]","expected_output":"5"}]"#).unwrap();
        assert_eq!(cases, vec![TestCase::new("t1", "[2,3]", "5")]);
    }

    #[test]
    fn test_parse_wrapped_camel_case() {
        let content = r#"{"testCases":[{"id":"t1","input":"","expectedOutput":"0","description":"no args"}]}"#;
        let cases = parse_test_suite(content).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].description.as_deref(), Some("no args"));
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let content = r#"[
            {"id":"t1","input":"1","expected_output":"1"},
            {"id":"t1","input":"2","expected_output":"2"}
        ]"#;
        let err = parse_test_suite(content).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();

        init_project(dir.path(), false).unwrap();
        let written = GraderConfig::load(&dir.path().join(DEFAULT_CONFIG_PATH)).unwrap();
        assert_eq!(written, GraderConfig::default());

        assert!(init_project(dir.path(), false).is_err());
        assert!(init_project(dir.path(), true).is_ok());
    }

    #[test]
    fn test_resolve_missing_function() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.js");
        fs::write(&path, "const x = 1;").unwrap();

        assert!(resolve(&path).is_err());
    }

    #[tokio::test]
    async fn test_grade_rejects_unsupported_language() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("solution.py");
        let tests = dir.path().join("tests.json");
        fs::write(&source, "def add(p): return p[0] + p[1]").unwrap();
        fs::write(&tests, r#"[{"id":"t1","input":"[2,3]","expected_output":"5"}]"#).unwrap();

        let err = grade(&GraderConfig::default(), &source, &tests, "python", None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported submission language"));
    }
}
