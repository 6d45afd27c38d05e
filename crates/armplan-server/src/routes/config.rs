use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: read-only view of the running configuration.
///
/// Credentials are excluded from serialization. Configuration comes from the
/// environment at startup; there is no write endpoint.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let json = serde_json::to_value(app.config.as_ref())?;
    Ok(Json(json))
}
