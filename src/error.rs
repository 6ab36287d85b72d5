use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compute::ComputeError;
use crate::domain::SaleConfigError;
use crate::engine::OrderError;
use crate::orchestration::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<SaleConfigError> for AppError {
    fn from(err: SaleConfigError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidOrder(_) => AppError::BadRequest(err.to_string()),
            OrderError::InsufficientFunds { .. } => AppError::Unprocessable(err.to_string()),
            OrderError::NoPath => AppError::Unavailable(err.to_string()),
        }
    }
}

impl From<ComputeError> for AppError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::Invalid(e) => e.into(),
            ComputeError::Timeout(_) => AppError::Timeout(err.to_string()),
            ComputeError::Superseded { .. } => AppError::Unavailable(err.to_string()),
            ComputeError::Failed(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Config(e) => e.into(),
            SessionError::Compute(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}
