//! Root route handler.

use axum::response::{IntoResponse, Response};

/// Body returned by `GET /`.
pub const ROOT_MESSAGE: &str = "Server is running!";

/// Root handler. A plain-text confirmation that the server is up.
pub fn index() -> Response {
    ROOT_MESSAGE.into_response()
}
