//! HTTP-facing errors
//!
//! Every error body has the shape `{"success": false, "error": <status>,
//! "message": <text>}`, matching the authorization failures produced by
//! `patisserie-auth`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};

use crate::store::StoreError;

/// A request that could not be served
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid fields
    #[error("{0}")]
    BadRequest(String),

    /// Unknown record or route
    #[error("resource not found")]
    NotFound,

    /// Body that is not JSON
    #[error("unprocessable")]
    Unprocessable,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = status.as_u16(), error = %self, "Request failed");
        let body = json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::NotFound,
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::BadRequest(e.body_text()),
            other => {
                warn!(error = %other, "Rejected request body");
                Self::Unprocessable
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::NotFound
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
