//! Error types for the agenda service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::AppointmentStatus;

/// Failures reported by an entity store
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row with that id is visible to the caller
    #[error("Record not found")]
    NotFound,

    /// The store refused the operation; the message is passed through
    #[error("{0}")]
    Rejected(String),

    /// Error from the PostgreSQL driver
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back to the model
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Error type for every agenda operation
#[derive(Error, Debug)]
pub enum AgendaError {
    /// A mutating operation was attempted without an owner identity
    #[error("User not authenticated")]
    Unauthenticated,

    /// Input was rejected before reaching the store
    #[error("{0}")]
    Validation(String),

    /// The entity store rejected the operation
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The appointment is not in a state that allows this change
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl AgendaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgendaError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AgendaError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AgendaError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AgendaError::Store(_) => StatusCode::BAD_GATEWAY,
            AgendaError::InvalidTransition { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AgendaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for agenda results
pub type AgendaResult<T> = Result<T, AgendaError>;

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_messages_pass_through_verbatim() {
        let err = AgendaError::from(StoreError::Rejected(
            "duplicate key value violates unique constraint".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn maps_taxonomy_to_http_status() {
        assert_eq!(
            AgendaError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AgendaError::Validation("x".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AgendaError::Store(StoreError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AgendaError::InvalidTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Canceled,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }
}
