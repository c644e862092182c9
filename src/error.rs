//! Common error types for the skin report service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("No image uploaded.")]
    MissingImage,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload is too large.")]
    PayloadTooLarge,

    #[error("Image host error: {0}")]
    ImageHost(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Analysis failed after {attempts} attempt(s): {reason}")]
    AnalysisFailed { attempts: u32, reason: String },

    #[error("PDF rendering error: {0}")]
    Pdf(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl AppError {
    /// Status code, error type and code reported to the client
    fn classify(&self) -> (StatusCode, &'static str, Option<&'static str>) {
        match self {
            AppError::MissingImage => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("missing_image")),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "invalid_request_error", Some("payload_too_large")),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", Some("rate_limit_exceeded")),
            AppError::AnalysisFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", Some("analysis_failed")),
            AppError::Pdf(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", Some("pdf_failed")),
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::HttpClient(_)
            | AppError::Template(_)
            | AppError::ImageHost(_)
            | AppError::Model(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        }
    }

    /// Message shown to the client. Server-side failures never leak details.
    fn public_message(&self) -> String {
        match self {
            AppError::MissingImage
            | AppError::InvalidRequest(_)
            | AppError::PayloadTooLarge => self.to_string(),
            AppError::RateLimitExceeded => {
                "Rate limit exceeded. Please slow down your requests.".to_string()
            }
            AppError::Pdf(_) => "Failed to generate PDF".to_string(),
            _ => "Internal server error.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = self.classify();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.public_message(),
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
