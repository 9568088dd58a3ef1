mod health;
mod metrics;
mod count;

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use crate::error::CounterError;
use crate::models::ErrorResponse;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use count::count_handler;

// Maps failures onto a status and a JSON error body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    pub fn internal() -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "internal server error" }
    }
}

impl From<CounterError> for ApiError {
    fn from(err: CounterError) -> Self {
        if err.is_overloaded() {
            Self { status: StatusCode::SERVICE_UNAVAILABLE, message: "service overloaded" }
        } else {
            Self::internal()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.message.to_string() };
        (self.status, Json(body)).into_response()
    }
}

pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: "not found".to_string() }))
}
