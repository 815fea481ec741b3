use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Error returned by HTTP handlers. Every variant renders as
/// `{"error": <message>, "kind": <kind>}` with a matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The detail is logged but never sent to the client.
    #[error("Solver failure: {0}")]
    SolverFailure(String),

    #[error("Solver timed out after {0:?}")]
    SolverTimeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable failure kind carried in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    SolverFailure,
    SolverTimeout,
    InternalError,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound        => StatusCode::NOT_FOUND,
            ErrorKind::SolverFailure   => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::SolverTimeout   => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::InternalError   => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_)    => ErrorKind::ValidationError,
            ApiError::NotFound(_)      => ErrorKind::NotFound,
            ApiError::SolverFailure(_) => ErrorKind::SolverFailure,
            ApiError::SolverTimeout(_) => ErrorKind::SolverTimeout,
            ApiError::Internal(_)      => ErrorKind::InternalError,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::NotFound(path) => format!("No route for {}", path),
            ApiError::SolverFailure(_) => "The solver could not process this question".to_string(),
            ApiError::SolverTimeout(_) => "The solver took too long to answer".to_string(),
            ApiError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = kind.status();
        if status.is_server_error() {
            tracing::error!(kind = ?kind, "{}", self);
        }

        let body = ErrorBody { error: self.public_message(), kind };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
