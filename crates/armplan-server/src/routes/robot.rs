use axum::Json;

/// GET /api/robot/status: there is no real arm, so it is always idle at home.
pub async fn get_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "idle",
        "position": armplan_core::position::Position::HOME,
        "gripper_state": "open",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
