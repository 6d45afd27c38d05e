use armplan_core::sequence::CommandSequence;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/commands/validate: check a sequence against the configured
/// workspace and report its estimated duration.
pub async fn validate_commands(
    State(app): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let sequence = CommandSequence::from_json(body)?;
    let validation = sequence.validate_sequence(&app.config.workspace);

    tracing::debug!(
        commands = sequence.len(),
        errors = validation.errors.len(),
        "validated command sequence"
    );

    Ok(Json(serde_json::json!({
        "valid": validation.valid,
        "errors": validation.errors,
        "command_count": sequence.len(),
        "estimated_duration": sequence.estimate_total_time(),
        "status": sequence.status,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use armplan_core::config::Config;
    use axum::response::IntoResponse;

    fn state() -> AppState {
        AppState::new(Config::default())
    }

    #[tokio::test]
    async fn reports_gripper_errors() {
        let body = serde_json::json!([
            { "action": "close_gripper", "description": "grab" },
            { "action": "close_gripper", "description": "grab again" },
        ]);
        let json = validate_commands(State(state()), Ok(Json(body))).await.unwrap().0;
        assert_eq!(json["valid"], false);
        assert_eq!(json["command_count"], 2);
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().unwrap().contains("already closed"));
    }

    #[tokio::test]
    async fn accepts_sequence_record() {
        let body = serde_json::json!({
            "commands": [{ "action": "move_to", "x": 100, "y": 0, "z": 0, "speed": 50 }],
            "status": "executing",
        });
        let json = validate_commands(State(state()), Ok(Json(body))).await.unwrap().0;
        assert_eq!(json["valid"], true);
        assert_eq!(json["status"], "executing");
        assert!((json["estimated_duration"].as_f64().unwrap() - 3.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_action_is_bad_request() {
        let body = serde_json::json!([{ "action": "teleport" }]);
        let err = validate_commands(State(state()), Ok(Json(body))).await.unwrap_err();
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn malformed_shape_is_bad_request() {
        let body = serde_json::json!({ "commands": "nope" });
        let err = validate_commands(State(state()), Ok(Json(body))).await.unwrap_err();
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
