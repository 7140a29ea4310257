/// Route aggregation: JSON read API plus the SSE stream.
use axum::Router;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::webserver::state::AppState;

pub mod stream;
pub mod tokens;

/// Standard response envelope: `{success, data?, error?}`.
pub fn ok_body<T: Serialize>(data: T) -> serde_json::Value {
    json!({"success": true, "data": data})
}

pub fn error_body(message: &str) -> serde_json::Value {
    json!({"success": false, "error": message})
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(tokens::routes())
        .merge(stream::routes())
        .with_state(state)
}
