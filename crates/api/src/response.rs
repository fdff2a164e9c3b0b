//! Standardized API responses.
//!
//! Every body carries a `success` flag. Errors add a human-readable
//! `message` and the underlying `error` detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ingest::IngestSummary;
use serde::{Deserialize, Serialize};

/// Success response for an upload, carrying the worker's run summary
/// under the envelope's `data` key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: IngestSummary,
}

impl UploadResponse {
    pub fn new(summary: IngestSummary) -> Self {
        Self {
            success: true,
            message: "File processed successfully".into(),
            data: summary,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// API error type carrying the HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            message: self.message,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<policy_core::Error> for ApiError {
    fn from(err: policy_core::Error) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                Self::internal("Internal server error", err.to_string())
            }
            _ => Self::new(status, err.to_string()),
        }
    }
}
