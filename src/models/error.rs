use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::SendMessage;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn with_status(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        (status, Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: error.into(),
        }))
    }
}

/// Failures of room operations, reported only to the connection that caused them
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Not joined to note {0}")]
    RoomNotFound(Uuid),
    #[error("Failed to {action}")]
    Persistence {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl RoomError {
    pub fn persistence(action: &'static str, source: StoreError) -> Self {
        RoomError::Persistence { action, source }
    }

    pub fn note_not_found() -> Self {
        RoomError::NotFound("Note not found".to_string())
    }

    /// The `error` message sent back to the originating connection
    pub fn to_message(&self) -> SendMessage {
        SendMessage::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_hide_store_details() {
        let err = RoomError::persistence("update note", StoreError::Unavailable("pool timed out".into()));
        assert_eq!(err.to_string(), "Failed to update note");
        assert!(std::error::Error::source(&err).is_some());
    }
}
