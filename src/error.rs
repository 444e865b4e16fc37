// Error handling module for the blog API
// Provides the error taxonomy and its conversion into the response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::response::ApiResponse;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
///
/// Each variant maps to one HTTP status, which is also the envelope `code`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed field validation
    /// Maps to HTTP 400 Bad Request
    #[error("validation failed: {0}")]
    ValidationError(validator::ValidationErrors),

    /// Malformed or semantically invalid input
    /// Maps to HTTP 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing, malformed or rejected credentials
    /// Maps to HTTP 401 Unauthorized
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch the resource
    /// Maps to HTTP 403 Forbidden
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist (or is soft-deleted)
    /// Maps to HTTP 404 Not Found
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Database operation errors
    /// Maps to HTTP 500; details stay in the logs
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Any other server-side failure
    /// Maps to HTTP 500; details stay in the logs
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message that is safe to show to clients
    ///
    /// Logs at a level matching the severity; 500-class detail never leaves
    /// the process.
    fn client_message(&self) -> String {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                format!("invalid request: {}", summarize(errors))
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                message.clone()
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                message.clone()
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                message.clone()
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                format!("{} not found", resource)
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                "internal server error".to_string()
            }
            ApiError::InternalError(detail) => {
                error!("Internal error: {}", detail);
                "internal server error".to_string()
            }
        }
    }
}

/// Collapse field errors into `field: message; field: message`
fn summarize(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let detail = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", field, detail)
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();
        ApiResponse::error(status, message).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("post", 1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = ApiError::InternalError("connection string postgres://secret".into());
        assert_eq!(err.client_message(), "internal server error");

        let err = ApiError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.client_message(), "internal server error");
    }

    #[test]
    fn test_validation_summary_names_fields() {
        let errors = Sample { name: "ab".into() }.validate().unwrap_err();
        let message = ApiError::from(errors).client_message();
        assert_eq!(message, "invalid request: name: too short");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::not_found("post", 42).client_message(), "post not found");
    }
}
