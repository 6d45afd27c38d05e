pub mod embed;
pub mod error;
pub mod routes;
pub mod state;

use armplan_core::config::Config;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Headroom on top of the base64-inflated image limit for the rest of the JSON body.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Request body cap: the image limit after base64 inflation, plus overhead.
fn body_limit(max_image_size: usize) -> usize {
    (max_image_size / 3)
        .saturating_mul(4)
        .saturating_add(BODY_OVERHEAD)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("ignoring invalid CORS origin: {o}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(config: Config) -> Router {
    let cors = cors_layer(&config);
    let body_limit = body_limit(config.max_image_size);
    let app_state = state::AppState::new(config);

    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/analyze", post(routes::analyze::analyze))
        .route("/api/robot/status", get(routes::robot::get_status))
        .route("/api/models/available", get(routes::models::list_models))
        .route("/api/config", get(routes::config::get_config))
        .route(
            "/api/commands/validate",
            post(routes::commands::validate_commands),
        )
        .fallback(embed::static_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the armplan server on `port`.
pub async fn serve(config: Config, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener, open_browser).await
}

/// Start the armplan server on a pre-bound listener.
///
/// Lets the caller read the actual port first, which matters when binding
/// port 0 and letting the OS pick.
pub async fn serve_on(
    config: Config,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    tracing::info!(
        environment = config.environment.as_str(),
        model = %config.default_ai_model,
        "Starting armplan on port {actual_port}"
    );
    let app = build_router(config);

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
