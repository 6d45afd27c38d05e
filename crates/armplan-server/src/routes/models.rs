use armplan_core::config::AVAILABLE_MODELS;
use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/models/available: selectable model names and the active one.
pub async fn list_models(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "models": AVAILABLE_MODELS,
        "current_model": app.config.default_ai_model,
    }))
}
