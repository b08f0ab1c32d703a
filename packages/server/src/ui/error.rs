//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    domain::{RepositoryError, SessionRuleError, ValueObjectError},
    usecase::SessionCommandError,
};

/// Error returned by HTTP handlers. Rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// No caller identity on the request.
    Unauthorized,
    Command(SessionCommandError),
}

impl From<SessionCommandError> for ApiError {
    fn from(error: SessionCommandError) -> Self {
        Self::Command(error)
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(error: ValueObjectError) -> Self {
        Self::Command(SessionCommandError::InvalidInput(error))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Command(error) => command_status(error),
        }
    }
}

fn command_status(error: &SessionCommandError) -> StatusCode {
    match error {
        SessionCommandError::SessionNotFound(_) | SessionCommandError::UserNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        SessionCommandError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SessionCommandError::Rejected(rule) => match rule {
            SessionRuleError::NotOwner(_) | SessionRuleError::NotParticipant(_) => {
                StatusCode::FORBIDDEN
            }
            SessionRuleError::TicketNotFound(_) => StatusCode::NOT_FOUND,
            SessionRuleError::NoCurrentTicket
            | SessionRuleError::VotingAlreadyActive
            | SessionRuleError::VotingNotActive
            | SessionRuleError::VotingNotOpen
            | SessionRuleError::AlreadyOwner(_) => StatusCode::CONFLICT,
        },
        SessionCommandError::Storage(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
        SessionCommandError::Storage(RepositoryError::Storage(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Unauthorized => "missing or invalid x-user-id header".to_string(),
            Self::Command(error) => error.to_string(),
        };
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", message);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
