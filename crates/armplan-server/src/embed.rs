use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "../../frontend/"]
struct FrontendAssets;

/// Asset directories that 404 instead of falling back to index.html.
const ASSET_DIRS: &[(&str, &str)] = &[("css/", "CSS"), ("js/", "JS"), ("assets/", "Asset")];

/// Serve embedded frontend assets. Unknown non-asset paths get index.html.
pub async fn static_handler(uri: axum::http::Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if let Some(content) = <FrontendAssets as Embed>::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.to_vec(),
        )
            .into_response();
    }

    if path.starts_with("api/") {
        return AppError::not_found(format!("no route for /{path}")).into_response();
    }

    for (prefix, kind) in ASSET_DIRS {
        if let Some(name) = path.strip_prefix(prefix) {
            tracing::error!("{kind} file not found: {name}");
            return (
                StatusCode::NOT_FOUND,
                format!("{kind} file not found: {name}"),
            )
                .into_response();
        }
    }

    match <FrontendAssets as Embed>::get("index.html") {
        Some(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            content.data.to_vec(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "frontend not bundled").into_response(),
    }
}
