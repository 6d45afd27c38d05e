use armplan_core::ArmplanError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

// ---------------------------------------------------------------------------
// Internal sentinels
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// A 500 whose client-facing message is fixed; `detail` only reaches the log.
#[derive(Debug)]
struct InternalError {
    public: &'static str,
    detail: String,
}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.public, self.detail)
    }
}

impl std::error::Error for InternalError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// Client errors echo their message. Server errors are logged in full and
/// answered with a generic message so internals never leak.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    /// Construct a 500 that answers with `public` and logs `detail`.
    pub fn internal(public: &'static str, detail: impl std::fmt::Display) -> Self {
        Self(
            InternalError {
                public,
                detail: detail.to_string(),
            }
            .into(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(e) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": e.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }
        if let Some(e) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": e.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }
        if let Some(e) = self.0.downcast_ref::<InternalError>() {
            tracing::error!("{e}");
            let body = serde_json::json!({ "error": e.public });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<ArmplanError>() {
            match e {
                ArmplanError::InvalidAction(_)
                | ArmplanError::InvalidStatus(_)
                | ArmplanError::InvalidTimestamp(_)
                | ArmplanError::ImageDecode(_)
                | ArmplanError::ImageRejected(_)
                | ArmplanError::Json(_) => StatusCode::BAD_REQUEST,
                ArmplanError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ArmplanError::InvalidConfig { .. } | ArmplanError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let message = if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn invalid_action_maps_to_400() {
        let err = AppError(ArmplanError::InvalidAction("fly".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_timestamp_maps_to_400() {
        let err = AppError(ArmplanError::InvalidTimestamp("yesterday".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn image_decode_maps_to_400() {
        let err = AppError(ArmplanError::ImageDecode("bad png".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn image_too_large_maps_to_413() {
        let err = AppError(
            ArmplanError::ImageTooLarge {
                size: 20,
                limit: 10,
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        let err = AppError(ArmplanError::Io(io_err).into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_domain_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_constructor_maps_to_400() {
        let err = AppError::bad_request("description is required");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_constructor_maps_to_404() {
        let err = AppError::not_found("no such asset");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_constructor_maps_to_500() {
        let err = AppError::internal("Analysis failed", "task join error");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json() {
        let err = AppError(ArmplanError::InvalidAction("fly".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(
            ct.to_str().unwrap().contains("application/json"),
            "expected JSON content type, got {:?}",
            ct
        );
    }
}
