//! Error handling module for the trip planner backend.
//!
//! Every core operation returns an [`AppError`] variant; the mapping to HTTP
//! status codes and the response envelope lives here and nowhere else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const OWNERSHIP_MISMATCH: &str = "OWNERSHIP_MISMATCH";
    pub const CONFLICT: &str = "CONFLICT";
    pub const UNRESOLVABLE_MEMBERS: &str = "UNRESOLVABLE_MEMBERS";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
}

/// Message reported when an owner already has a collection with the requested name.
pub const DUPLICATE_COLLECTION_NAME: &str =
    "A collection with this name already exists for this user";

/// Application error type.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Malformed input: empty required field, malformed identifier
    Validation(String),
    /// Referenced collection, day plan or user does not exist
    NotFound(String),
    /// A referenced day plan belongs to another user
    Ownership(String),
    /// Uniqueness violation (collection name per owner, user email)
    Conflict(String),
    /// One or more day plan ids could not be resolved
    UnresolvableMembers { missing_ids: Vec<String> },
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Ownership(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnresolvableMembers { .. } => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Ownership(_) => codes::OWNERSHIP_MISMATCH,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::UnresolvableMembers { .. } => codes::UNRESOLVABLE_MEMBERS,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Ownership(msg)
            | AppError::Conflict(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::UnresolvableMembers { missing_ids } => {
                format!("Some day plans not found: {}", missing_ids.join(", "))
            }
        }
    }

    /// Structured details attached to the error envelope, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::UnresolvableMembers { missing_ids } => {
                Some(serde_json::json!({ "missingIds": missing_ids }))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                tracing::debug!("Unique constraint violated: {}", db_err.message());
                let message = if db_err.message().contains("collections.") {
                    DUPLICATE_COLLECTION_NAME
                } else if db_err.message().contains("users.email") {
                    "A user with this email already exists"
                } else {
                    "Unique constraint violated"
                };
                return AppError::Conflict(message.to_string());
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON encoding error: {:?}", err);
        AppError::Internal(format!("JSON encoding error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details: error.details(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct_per_kind() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Ownership("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unresolvable_members_lists_every_id() {
        let err = AppError::UnresolvableMembers {
            missing_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.error_code(), codes::UNRESOLVABLE_MEMBERS);
        assert_eq!(err.message(), "Some day plans not found: a, b");

        let body = ErrorResponse::new(&err);
        assert!(!body.success);
        let details = body.error.details.unwrap();
        assert_eq!(details["missingIds"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::Conflict("taken".into());
        assert_eq!(err.to_string(), "CONFLICT: taken");
    }
}
