use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    auth::password::PasswordError,
    dao::storage::StorageError,
    state::lifecycle::{InvalidTransition, LifecycleError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while serving the request.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing, invalid or superseded credentials (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated caller lacks the required role (HTTP 403). Together with
    /// [`ServiceError::Unauthorized`] this covers every privilege failure.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Lifecycle action not allowed from the current contest status.
    #[error(transparent)]
    InvalidTransition(InvalidTransition),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Team referenced by a draw or submission does not exist.
    #[error("team not found")]
    TeamNotFound,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The team has submitted for every question.
    #[error("no unsolved question left for this team")]
    Exhausted,
    /// The question has no answer flagged correct.
    #[error("question `{0}` has no correct answer configured")]
    NoCorrectAnswerConfigured(uuid::Uuid),
    /// Draws and submissions are only accepted while the contest runs.
    #[error("contest is not running")]
    ContestNotActive,
    /// Write rejected because of existing data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
    /// Unexpected failure outside storage.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { message } => ServiceError::Conflict(message),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidTransition(err)
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition(invalid) => ServiceError::InvalidTransition(invalid),
            LifecycleError::DurationOutOfRange => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Request is well-formed but the data cannot be processed.
    #[error("unprocessable: {0}")]
    UnprocessableEntity(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error; details are logged, never returned.
    #[error("internal server error")]
    Internal,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage failure while serving request");
                AppError::Internal
            }
            ServiceError::Internal(message) => {
                error!(error = %message, "internal failure while serving request");
                AppError::Internal
            }
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidTransition(invalid) => AppError::Conflict(invalid.to_string()),
            err @ (ServiceError::ContestNotActive | ServiceError::Exhausted) => {
                AppError::Conflict(err.to_string())
            }
            ServiceError::Conflict(message) => AppError::Conflict(message),
            err @ ServiceError::TeamNotFound => AppError::NotFound(err.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            err @ ServiceError::NoCorrectAnswerConfigured(_) => {
                AppError::UnprocessableEntity(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
