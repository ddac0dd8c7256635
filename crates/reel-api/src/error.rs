//! API error types.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use reel_worker::{ValidationError, WorkerError};

use crate::pages;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Processing(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// English and Telugu messages shown to the user.
    fn messages(&self) -> (String, String) {
        match self {
            ApiError::Validation(v) => (v.english(), v.telugu()),
            ApiError::NotFound(msg) => (msg.clone(), "వీడియో కనుగొనబడలేదు.".to_string()),
            ApiError::BadRequest(msg) => (msg.clone(), "చెల్లని అభ్యర్థన.".to_string()),
            ApiError::Unavailable(_) => (
                "The server is busy rendering other videos. Please try again shortly.".to_string(),
                "సర్వర్ ఇతర వీడియోలతో బిజీగా ఉంది. దయచేసి కొద్దిసేపటి తర్వాత మళ్లీ ప్రయత్నించండి.".to_string(),
            ),
            ApiError::Processing(_) | ApiError::Internal(_) => (
                "Video processing failed.".to_string(),
                "వీడియో ప్రాసెసింగ్ విఫలమైంది.".to_string(),
            ),
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::Validation(v) => ApiError::Validation(v),
            WorkerError::Busy(msg) => ApiError::Unavailable(msg),
            WorkerError::Cancelled => ApiError::Unavailable("Rendering was cancelled".to_string()),
            other => {
                let detail = match other.stderr() {
                    Some(stderr) => format!("{}\n{}", other, stderr),
                    None => other.to_string(),
                };
                ApiError::Processing(detail)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (english, telugu) = self.messages();

        let detail = match &self {
            ApiError::Processing(d) | ApiError::Internal(d) => {
                error!("Request failed: {}", d);
                // Don't expose internal error details in production
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    None
                } else {
                    Some(d.clone())
                }
            }
            ApiError::Unavailable(d) => {
                warn!("Request refused: {}", d);
                None
            }
            _ => None,
        };

        (status, Html(pages::error_page(&english, &telugu, detail.as_deref()))).into_response()
    }
}
