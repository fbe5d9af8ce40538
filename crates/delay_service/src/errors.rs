//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flightdelay_core::{PredictError, ValidationError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request failures, each mapped to one status code
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Predict(PredictError::ModelUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Predict(PredictError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "prediction request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "rejected prediction request: {}", self);
        }

        let payload = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, payload).into_response()
    }
}
