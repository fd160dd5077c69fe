mod handlers;
mod metrics;
mod routes;

use axum::Router;
use codegrade_common::config::GraderConfig;
use codegrade_engine::Grader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub grader: Grader,
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("codegrade API booting...");

    let config = match std::env::var("GRADER_CONFIG") {
        Ok(path) => GraderConfig::load(&PathBuf::from(path)).and_then(GraderConfig::with_env_overrides),
        Err(_) => GraderConfig::load_default(),
    }
    .expect("Failed to load grader config");

    info!(
        node_binary = %config.node_binary,
        default_timeout_ms = config.default_timeout_ms,
        memory_limit_mb = config.memory_limit_mb,
        "Grader configured"
    );

    let state = Arc::new(AppState {
        grader: Grader::from_config(&config),
    });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let addr = std::env::var("API_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind to address");

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
