// Authentication and account error types

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Authentication and account errors
///
/// Every token problem collapses into `InvalidToken` so that a client cannot
/// tell a bad signature from an expired or malformed token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("username already exists")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("old password is incorrect")]
    WrongPassword,

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("password hashing error: {0}")]
    PasswordHashError(String),

    #[error("token generation error: {0}")]
    TokenGenerationError(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => ApiError::Unauthorized(err.to_string()),
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::WrongPassword => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::UserNotFound(id) => ApiError::not_found("user", id),
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                ApiError::InternalError(err.to_string())
            }
            AuthError::DatabaseError(db_error) => ApiError::DatabaseError(db_error),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
