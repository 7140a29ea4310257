/// JSON read API: token list, single token, stats, manual analysis.
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::types::MigrationEvent;
use crate::webserver::routes::{error_body, ok_body};
use crate::webserver::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens", get(get_tokens))
        .route("/tokens/:address", get(get_token))
        .route("/stats", get(get_stats))
        .route("/analyze", post(post_analyze))
        .route("/health", get(get_health))
}

#[derive(Debug, Deserialize)]
struct TokensQuery {
    passed: Option<bool>,
    limit: Option<usize>,
}

async fn get_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokensQuery>,
) -> Json<serde_json::Value> {
    // First call boots the pipeline
    if !state.monitor.is_running() {
        state.monitor.start();
    }

    let limit = query.limit.unwrap_or(100).min(crate::monitor::MAX_HISTORY);
    let mut tokens = state.monitor.snapshot(crate::monitor::MAX_HISTORY);
    if let Some(passed) = query.passed {
        tokens.retain(|record| record.analysis.passed == passed);
    }
    tokens.truncate(limit);

    Json(ok_body(json!({
        "tokens": tokens,
        "stats": state.monitor.stats(),
        "count": tokens.len(),
        "isConnected": state.monitor.is_connected(),
    })))
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.monitor.get(&address) {
        Some(record) => (StatusCode::OK, Json(ok_body(record))),
        None => (
            StatusCode::NOT_FOUND,
            Json(error_body("Token not found in history")),
        ),
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(ok_body(json!({
        "monitored": state.monitor.stats().monitored,
        "passed": state.monitor.stats().passed,
        "filtered": state.monitor.stats().filtered,
        "providers": state.enricher.provider_stats(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    token_address: String,
    creator: Option<String>,
}

async fn post_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mint = request.token_address.trim();
    if mint.len() < 32 || mint.len() > 44 {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body("tokenAddress must be a base-58 mint address")),
        );
    }

    let event = MigrationEvent::manual(mint, request.creator.clone());
    let record = state.monitor.analyze_once(&event).await;

    if record.analysis.score < 0 || record.analysis.score > 100 {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body("Analysis produced an invalid score")),
        );
    }

    (StatusCode::OK, Json(ok_body(record)))
}

async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(ok_body(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.uptime_seconds(),
        "monitorRunning": state.monitor.is_running(),
        "upstreamConnected": state.monitor.is_connected(),
    })))
}
