use super::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let ai_service = state.ai_health.health_check().await;
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "aiService": ai_service,
    }))
}
