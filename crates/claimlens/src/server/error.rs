//! HTTP error responses for the analysis API.
//!
//! Every failure leaves the handler as `{ "error": message }` with a status
//! the mapping below fixes per error class. Client mistakes are 4xx; the
//! upstream vision API failing is a gateway problem, not ours.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use claimlens_core::AnalysisError;
use serde_json::json;

/// An error message paired with the HTTP status it maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::EmptyImage
            | AnalysisError::UnsupportedFormat(_)
            | AnalysisError::ImageTooLarge { .. }
            | AnalysisError::Decode(_)
            | AnalysisError::UnknownEngine(_)
            | AnalysisError::UnknownLanguage(_)
            | AnalysisError::EngineNotConfigured(_)
            | AnalysisError::Fetch(_) => StatusCode::BAD_REQUEST,
            AnalysisError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalysisError::Provider { .. } => StatusCode::BAD_GATEWAY,
            AnalysisError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
