//! Error types for crewdesk-server
//!
//! Every error leaving a handler becomes `{"success": false, "error": "..."}`
//! with a matching status code. Integration failures caused by missing
//! configuration or an unreachable upstream are client-visible problems
//! (400); anything unexpected is a 500.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::{AccountingError, CallStatsError, DirectoryError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Conflict (409), e.g. duplicate worker email
    #[error("{0}")]
    Conflict(String),

    /// Upstream integration failed (500)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// crewdesk-common error
    #[error(transparent)]
    Common(#[from] crewdesk_common::Error),
}

impl ApiError {
    pub fn worker_not_found() -> Self {
        ApiError::NotFound("Worker not found".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(err) => match err {
                crewdesk_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                crewdesk_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                crewdesk_common::Error::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Configuration(_)
            | DirectoryError::Connectivity(_)
            | DirectoryError::EmptyResult(_) => ApiError::BadRequest(err.to_string()),
            DirectoryError::Parse(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<CallStatsError> for ApiError {
    fn from(err: CallStatsError) -> Self {
        match err {
            CallStatsError::Configuration(_) => ApiError::BadRequest(err.to_string()),
            CallStatsError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CallStatsError::Connectivity(_) | CallStatsError::Parse(_) => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

impl From<AccountingError> for ApiError {
    fn from(err: AccountingError) -> Self {
        match err {
            AccountingError::Configuration(_)
            | AccountingError::Connectivity(_)
            | AccountingError::GraphQl(_) => ApiError::BadRequest(err.to_string()),
            AccountingError::Parse(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
