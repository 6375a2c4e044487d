use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sketchface_core::error::CoreError;
use sketchface_inference::InferenceError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`InferenceError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `sketchface_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A model runtime error from `sketchface_inference`.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed request whose content cannot be processed.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// A server-side failure whose message is safe to show the client.
    #[error("Service failure: {0}")]
    ServiceFailure(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Io(_) | CoreError::Internal(_) => internal(core),
            },

            // --- Model runtime errors ---
            AppError::Inference(err) => internal(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::ServiceFailure(msg) => {
                tracing::error!(error = %msg, "Service failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVICE_FAILURE",
                    msg.clone(),
                )
            }
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Log the detail and return a sanitized 500.
fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
