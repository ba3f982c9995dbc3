//! JSON error responses.

use crate::Error;
use crate::observability::current_request_id;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};

/// Message returned for downstream failures. Causes are logged, never sent.
pub const INTERNAL_ERROR: &str = "internal server error";

/// Message returned for missing or invalid bearer tokens.
pub const UNAUTHORIZED: &str = "unauthorized";

/// Message returned for rejected node creation.
pub const SIMILAR_NODE_EXISTS: &str = "similar node already exists";

/// An error rendered as `{"error": ..., "details": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<Value>,
    score: Option<f64>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

impl ApiError {
    /// Creates an error with a status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            score: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds a top-level similarity `score`.
    #[must_use]
    pub const fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// 400 with `message`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 with the generic message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(message) => Self::new(StatusCode::BAD_REQUEST, message),
            Error::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            Error::AlreadyExists(message) => Self::new(StatusCode::NOT_ACCEPTABLE, message),
            Error::SimilarNodeExists { score } => {
                Self::new(StatusCode::CONFLICT, SIMILAR_NODE_EXISTS)
                    .with_details(json!({
                        "score": score,
                        "message": format!("A node with a similarity score of {score} already exists."),
                    }))
                    .with_score(score)
            },
            Error::Unauthorized(message) => Self::new(StatusCode::UNAUTHORIZED, message),
            Error::OperationFailed { operation, cause } => {
                tracing::error!(
                    request_id = current_request_id().as_deref().unwrap_or("-"),
                    operation = %operation,
                    cause = %cause,
                    "Request failed"
                );
                metrics::counter!("atlas_operation_failures_total", "operation" => operation)
                    .increment(1);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            details: self.details.as_ref(),
            score: self.score,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
