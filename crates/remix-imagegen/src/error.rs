use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::types::ErrorResponse;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors surfaced to API consumers
///
/// Upstream inference failures are not part of this type: they are masked
/// by placeholder substitution inside the generator.
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Missing, malformed, or rejected upload fields
    #[error("{0}")]
    InvalidUpload(String),

    /// The upload passed validation but could not be decoded
    #[error("Error processing image: {0}")]
    ImageProcessing(String),

    /// Anything unexpected while assembling a response
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ImageGenError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUpload(_) | Self::ImageProcessing(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for ImageGenError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
