use armplan_core::vision::{self, WorkspaceInfo};
use armplan_core::ArmplanError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// POST /api/analyze: turn a task description (and optional image) into a
/// scene analysis and a validated, timed command sequence.
pub async fn analyze(
    State(app): State<AppState>,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let preview: String = body.description.chars().take(100).collect();
    tracing::info!("Analyzing task: {preview}...");

    let workspace_info = match body.image.filter(|s| !s.trim().is_empty()) {
        Some(image) => Some(inspect_image(image, app.config.max_image_size).await?),
        None => None,
    };

    let result = {
        let mut rng = rand::thread_rng();
        app.analyzer
            .analyze(&mut rng, &body.description, &app.config.workspace)
    };

    let mut sequence = result.sequence;
    sequence.execution_id = Some(uuid::Uuid::new_v4().to_string());
    let commands: Vec<_> = sequence.commands.iter().map(|c| c.to_record()).collect();

    tracing::info!(
        "Generated {} commands for {} task",
        commands.len(),
        result.task_type
    );

    let mut response = serde_json::json!({
        "analysis": result.analysis,
        "objects_detected": result.objects,
        "confidence": result.confidence,
        "task_type": result.task_type,
        "commands": commands,
        "execution_time_estimate": result.execution_time_estimate,
        "execution_id": sequence.execution_id,
        "validation": result.validation,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    if let Some(info) = workspace_info {
        response["workspace_info"] = serde_json::to_value(info)
            .map_err(|e| AppError::internal("Analysis failed", e))?;
    }

    Ok(Json(response))
}

/// Decode and measure the uploaded image off the async runtime.
async fn inspect_image(data: String, max_bytes: usize) -> Result<WorkspaceInfo, AppError> {
    let info = tokio::task::spawn_blocking(move || {
        let img = vision::decode_image(&data, max_bytes)?;
        vision::validate_image(&img)?;
        let prepared = vision::prepare_image(&img);
        Ok::<_, ArmplanError>(vision::extract_workspace_info(&prepared))
    })
    .await
    .map_err(|e| AppError::internal("Analysis failed", format!("task join error: {e}")))??;

    tracing::info!(
        objects = info.estimated_object_count,
        lighting = ?info.lighting_quality,
        "extracted workspace info"
    );
    Ok(info)
}
