//! HTTP error mapping: domain and store errors to JSON error bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::orchestrator::SubmitError;
use crate::store::StoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `QUEST_NOT_ACTIVE`,
    /// `USER_REQUIRED`, `NOT_FOUND`, `SCORING_TIMEOUT`, `SCORING_FAILED`, `INTERNAL_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
    /// Set when a submission record exists for the failed request.
    #[serde(rename = "submissionId", skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    QuestNotActive(String),
    /// No `x-user-id` header on an endpoint that needs one.
    UserRequired,
    NotFound(String),
    ScoringTimeout { submission_id: String },
    ScoringFailed { submission_id: String },
    Internal(String),
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let body = |code, message: String, submission_id| ErrorBody { code, message, submission_id };
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", msg, None)),
            ApiError::QuestNotActive(msg) => (StatusCode::BAD_REQUEST, body("QUEST_NOT_ACTIVE", msg, None)),
            ApiError::UserRequired => (
                StatusCode::UNAUTHORIZED,
                body("USER_REQUIRED", "The x-user-id header is required".into(), None),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg, None)),
            ApiError::ScoringTimeout { submission_id } => (
                StatusCode::GATEWAY_TIMEOUT,
                body("SCORING_TIMEOUT", "Scoring timed out, please try again".into(), Some(submission_id)),
            ),
            ApiError::ScoringFailed { submission_id } => (
                StatusCode::BAD_GATEWAY,
                body("SCORING_FAILED", "Scoring failed, please try again".into(), Some(submission_id)),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(target: "writing_quest", "Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", "An unexpected error occurred".into(), None),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Invalid(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(msg) => ApiError::Validation(msg),
            SubmitError::QuestNotFound(_) | SubmitError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            SubmitError::QuestNotActive { .. } => ApiError::QuestNotActive(err.to_string()),
            SubmitError::Store(e) => e.into(),
            SubmitError::Task(detail) => ApiError::Internal(detail),
            SubmitError::Scoring { submission, cause } => {
                if cause.is_timeout() {
                    ApiError::ScoringTimeout { submission_id: submission.id }
                } else {
                    ApiError::ScoringFailed { submission_id: submission.id }
                }
            }
        }
    }
}
