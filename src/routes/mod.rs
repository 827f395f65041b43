//! HTTP surface of the payroll engine
//!
//! Handlers are thin adapters: decode the request, call the service, map the
//! service error to an HTTP status. Validation problems are not errors and
//! travel inside the response bodies.

pub mod calculations;
pub mod esocial;
pub mod events;
pub mod metrics;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use sqlx::PgPool;

use crate::esocial::builders::BuilderRegistry;
use crate::metrics::Metrics;

/// Shared state handed to every handler
pub struct AppState {
    pub pool: PgPool,
    pub metrics: Metrics,
    pub esocial_registry: BuilderRegistry,
}

/// Error response wrapper
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Service error mapped to an HTTP status
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    // Internal failures get a generic body; details stay in the logs
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Database error".to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
