//! Connection test.

use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

/// Methods served by the API.
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

/// Answer with allowed methods and no body.
pub async fn handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::ALLOW, ALLOWED_METHODS), (header::CONTENT_LENGTH, "0")],
    )
}
