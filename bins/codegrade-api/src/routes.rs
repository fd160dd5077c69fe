// Route table for the codegrade API

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/grade", post(handlers::grade_submission))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
}
