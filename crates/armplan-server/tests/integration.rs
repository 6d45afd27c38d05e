use armplan_core::config::Config;
use axum::http::StatusCode;
use base64::Engine as _;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app() -> axum::Router {
    armplan_server::build_router(Config::default())
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get_raw(app, uri).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request and return (status, content-type, raw body).
async fn get_raw(app: axum::Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST with an arbitrary (possibly malformed) JSON body.
async fn post_raw(app: axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn checkerboard_png(w: u32, h: u32) -> String {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        if ((x / 20) + (y / 20)) % 2 == 0 {
            image::Rgb([40, 40, 40])
        } else {
            image::Rgb([220, 220, 220])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(buf)
}

// ---------------------------------------------------------------------------
// Health / status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_healthy() {
    let (status, json) = get(app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn robot_is_idle_at_home() {
    let (status, json) = get(app(), "/api/robot/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "idle");
    assert_eq!(json["gripper_state"], "open");
    assert_eq!(json["position"]["x"], 0.0);
    assert_eq!(json["position"]["z"], 0.0);
}

#[tokio::test]
async fn models_lists_all_backends() {
    let (status, json) = get(app(), "/api/models/available").await;
    assert_eq!(status, StatusCode::OK);
    let models: Vec<&str> = json["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap())
        .collect();
    assert_eq!(models, ["mock", "openai", "anthropic", "google"]);
    assert_eq!(json["current_model"], "mock");
}

#[tokio::test]
async fn config_hides_secrets() {
    let (status, json) = get(app(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["environment"], "development");
    assert_eq!(json["workspace"]["z_max"], 150.0);
    assert!(json.get("secrets").is_none());
    assert!(!json.to_string().contains("secret-key"));
}

// ---------------------------------------------------------------------------
// Analyze
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_sorting_task() {
    let (status, json) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "description": "sort the red cube and blue box" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["task_type"], "sorting");
    assert_eq!(
        json["objects_detected"],
        serde_json::json!(["red_cube", "blue_box", "red", "blue"])
    );

    let commands = json["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 14);
    assert_eq!(commands[0]["action"], "move_to");
    assert_eq!(commands[0]["z"], 50.0);
    assert_eq!(commands[13]["action"], "move_to");
    assert!(commands.iter().all(|c| c["timestamp"].is_string()));

    assert_eq!(json["validation"]["valid"], true);
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.75..=0.98).contains(&confidence));
    assert!(json["execution_time_estimate"].as_f64().unwrap() > 0.0);
    assert!(json.get("workspace_info").is_none());
}

#[tokio::test]
async fn analyze_estimate_matches_validate_endpoint() {
    let (_, analyzed) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "description": "stack the green block" }),
    )
    .await;
    let (status, checked) = post_json(
        app(),
        "/api/commands/validate",
        analyzed["commands"].clone(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked["valid"], true);
    let rounded = (checked["estimated_duration"].as_f64().unwrap() * 10.0).round() / 10.0;
    assert_eq!(
        rounded,
        analyzed["execution_time_estimate"].as_f64().unwrap()
    );
}

#[tokio::test]
async fn analyze_with_image_includes_workspace_info() {
    let image = format!("data:image/png;base64,{}", checkerboard_png(200, 160));
    let (status, json) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "image": image, "description": "pick up the ball" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let info = &json["workspace_info"];
    assert_eq!(info["image_size"], serde_json::json!([200, 160]));
    assert_eq!(info["boundaries"]["confidence"], 0.7);
    assert!(info["edge_density"].as_f64().unwrap() > 0.0);
    assert!(info["estimated_object_count"].as_u64().unwrap() >= 1);
    assert!(info["lighting_quality"].is_string());
}

#[tokio::test]
async fn analyze_rejects_garbage_image() {
    let (status, json) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "image": "bm90IGFuIGltYWdl", "description": "pick" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    for uri in ["/api/analyze", "/api/commands/validate"] {
        let (status, json) = post_raw(app(), uri, "{ not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}: {json}");
    }
}

#[tokio::test]
async fn analyze_wrong_field_type_gets_json_error() {
    let (status, json) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "description": 42 }),
    )
    .await;
    assert!(status.is_client_error());
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn analyze_rejects_tiny_image() {
    let (status, _) = post_json(
        app(),
        "/api/analyze",
        serde_json::json!({ "image": checkerboard_png(50, 50) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_rejects_oversized_image() {
    let config = Config {
        max_image_size: 64,
        ..Config::default()
    };
    let (status, _) = post_json(
        armplan_server::build_router(config),
        "/api/analyze",
        serde_json::json!({ "image": checkerboard_png(200, 200) }),
    )
    .await;
    assert!(
        status == StatusCode::PAYLOAD_TOO_LARGE,
        "expected 413, got {status}"
    );
}

// ---------------------------------------------------------------------------
// Command validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_accepts_good_sequence() {
    let (status, json) = post_json(
        app(),
        "/api/commands/validate",
        serde_json::json!({
            "commands": [
                { "action": "move_to", "x": 50, "y": 50, "z": 20, "speed": 40 },
                { "action": "close_gripper", "force": 5 },
                { "action": "wait", "duration": 1.5 },
                { "action": "open_gripper" },
                { "action": "home" },
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert_eq!(json["command_count"], 5);
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn validate_reports_out_of_bounds_and_gripper_state() {
    let (status, json) = post_json(
        app(),
        "/api/commands/validate",
        serde_json::json!([
            { "action": "move_to", "x": 500, "y": 0, "z": 10, "description": "too far" },
            { "action": "open_gripper" },
            { "action": "open_gripper" },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], false);
    let errors: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(
        errors,
        [
            "Command 1 validation failed: too far",
            "Command 3: Attempting to open already open gripper",
        ]
    );
}

#[tokio::test]
async fn validate_rejects_unknown_action() {
    let (status, json) = post_json(
        app(),
        "/api/commands/validate",
        serde_json::json!([{ "action": "teleport" }]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("teleport"));
}

#[tokio::test]
async fn validate_accepts_move_without_position() {
    let (status, json) = post_json(
        app(),
        "/api/commands/validate",
        serde_json::json!([{ "action": "move_to", "x": 1 }]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);
    assert!((json["estimated_duration"].as_f64().unwrap() - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn validate_rejects_bad_timestamp() {
    let (status, json) = post_json(
        app(),
        "/api/commands/validate",
        serde_json::json!([{ "action": "home", "timestamp": "yesterday" }]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("yesterday"));
}

// ---------------------------------------------------------------------------
// Static assets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_serves_index() {
    let (status, content_type, body) = get_raw(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert!(String::from_utf8_lossy(&body).contains("<title>armplan</title>"));
}

#[tokio::test]
async fn stylesheet_is_served_with_css_type() {
    let (status, content_type, _) = get_raw(app(), "/css/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/css"));
}

#[tokio::test]
async fn missing_asset_is_404() {
    let (status, _, body) = get_raw(app(), "/css/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"CSS file not found: missing.css");
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let (status, json) = get(app(), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no route for /api/nope");
}
