use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors surfaced to the client within the request/response cycle.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Cannot {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("Unsupported charset \"{0}\" for a JSON body")]
    UnsupportedCharset(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedJson(_) | AppError::BodyRead(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::UnsupportedCharset(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

/// JSON error body, shaped like the health payload.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::NotFound { .. } => (status, self.to_string()).into_response(),
            _ => {
                tracing::debug!(status = status.as_u16(), error = %self, "Rejected request");
                let body = ErrorBody {
                    status: "error",
                    message: self.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
