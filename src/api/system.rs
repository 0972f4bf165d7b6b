use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub provider: String,
    pub ai_configured: bool,
    pub candidate_models: Vec<String>,
    pub uptime_seconds: u64,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "PreventAI API" }))
}

pub async fn test() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "API is working!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "healthy": true }))
}

/// Get current service status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let ai = &state.settings.ai;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: ai.provider.as_str().to_string(),
        ai_configured: state.llm.is_some(),
        candidate_models: ai.candidate_models(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
