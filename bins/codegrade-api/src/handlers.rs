// HTTP route handlers for the codegrade API

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use codegrade_common::types::{GradingReport, GradingRequest, GradingSummary};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GradeResponse {
    pub run_id: String,
    pub graded_at: DateTime<Utc>,
    pub summary: GradingSummary,
    pub results: GradingReport,
}

/// POST /grade - Grade a submission synchronously
pub async fn grade_submission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GradingRequest>,
) -> Response {
    let run_id = Uuid::new_v4();
    metrics::GRADING_REQUESTS.inc();

    let timer = metrics::GRADING_DURATION.start_timer();
    let outcome = state.grader.grade_submission(&payload).await;
    timer.observe_duration();

    match outcome {
        Ok(report) => {
            metrics::record_report(&report);
            let summary = report.summary();

            info!(
                run_id = %run_id,
                test_cases = summary.total,
                passed = summary.passed,
                "Submission graded"
            );

            (
                StatusCode::OK,
                Json(GradeResponse {
                    run_id: run_id.to_string(),
                    graded_at: Utc::now(),
                    summary,
                    results: report,
                }),
            )
                .into_response()
        }
        Err(e) => {
            metrics::REJECTED_SUBMISSIONS.inc();
            warn!(run_id = %run_id, error = %e, "Submission rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], buffer).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use codegrade_common::types::TestCase;
    use codegrade_engine::{ExecutionEngine, Grader, Invocation, InvocationFailure, Value};
    use std::time::Duration;

    /// Echoes its argument back, or throws when called without one.
    struct EchoEngine;

    #[async_trait]
    impl ExecutionEngine for EchoEngine {
        async fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, InvocationFailure> {
            invocation
                .argument
                .cloned()
                .ok_or_else(|| InvocationFailure::Threw("no input".to_string()))
        }
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            grader: Grader::new(Arc::new(EchoEngine), Duration::from_secs(1)),
        })
    }

    fn request(language: &str) -> GradingRequest {
        GradingRequest {
            language: language.to_string(),
            source_code: "function echo(x){ return x; }".to_string(),
            test_cases: vec![
                TestCase::new("same", "[1,2]", "[1,2]"),
                TestCase::new("different", "[1,2]", "[2,1]"),
                TestCase::new("missing", "", "0"),
            ],
            timeout_ms: None,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_grade_returns_report() {
        let response = grade_submission(State(state()), Json(request("javascript"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(Uuid::parse_str(body["run_id"].as_str().unwrap()).is_ok());
        assert_eq!(body["summary"]["total"], 3);
        assert_eq!(body["summary"]["passed"], 1);
        assert_eq!(body["summary"]["failed"], 1);
        assert_eq!(body["summary"]["errored"], 1);
        assert_eq!(body["summary"]["all_passed"], false);

        let statuses: Vec<_> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["status"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(statuses, vec!["Pass", "Fail", "Error"]);
    }

    #[tokio::test]
    async fn test_grade_rejects_unsupported_language() {
        let response = grade_submission(State(state()), Json(request("ruby"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("ruby"));
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        grade_submission(State(state()), Json(request("javascript"))).await;

        let response = metrics().await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("codegrade_grading_requests_total"));
        assert!(text.contains("codegrade_test_results_total"));
    }
}
