use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::Error;
use crate::usage::QuotaExceeded;

/// Failures surfaced to HTTP clients
///
/// Every variant renders as a short `text/plain` body.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    QuotaExceeded(#[from] QuotaExceeded),

    #[error("{0}")]
    Validation(&'static str),

    #[error("File too large! Max allowed is {max_mb}MB.")]
    PayloadTooLarge { max_mb: usize },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Malformed upload: {0}")]
    BadRequest(String),

    #[error("Invalid or corrupt PDF: {0}")]
    InvalidPdf(#[source] Error),

    #[error("Internal error: {0}")]
    Internal(#[source] Error),
}

impl From<Error> for WebError {
    fn from(err: Error) -> Self {
        if err.is_invalid_pdf() {
            WebError::InvalidPdf(err)
        } else {
            WebError::Internal(err)
        }
    }
}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        WebError::Internal(Error::Io(err))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::QuotaExceeded(_) => (StatusCode::FORBIDDEN, self.to_string()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            Self::Unauthorized => (StatusCode::FORBIDDEN, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::InvalidPdf(e) => {
                tracing::warn!("Rejected upload: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Invalid or corrupt PDF. Nothing was counted against your daily limit."
                        .to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
