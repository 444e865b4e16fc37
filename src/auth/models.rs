// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_username;

/// Account status; disabled accounts cannot log in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
    pub avatar: String,
    pub bio: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub nickname: String,
    pub avatar: String,
    pub bio: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            avatar: user.avatar,
            bio: user.bio,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields needed to persist a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
}

/// Profile fields to overwrite; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 50, message = "must be 3 to 50 characters"),
        custom = "validate_username"
    )]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 6, max = 128, message = "must be 6 to 128 characters"))]
    #[schema(example = "pw123456")]
    pub password: String,
    #[validate(email(message = "must be a valid email address"), length(max = 100))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    #[schema(example = "Alice")]
    pub nickname: Option<String>,
}

/// Login request DTO; `username` also accepts the account email
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    #[schema(example = "pw123456")]
    pub password: String,
}

/// Profile update DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub nickname: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub avatar: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    /// Empty strings are treated the same as omitted fields
    pub fn into_changes(self) -> ProfileChanges {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }
        ProfileChanges {
            nickname: keep(self.nickname),
            avatar: keep(self.avatar),
            bio: keep(self.bio),
        }
    }
}

/// Password change DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub old_password: String,
    #[validate(length(min = 6, max = 128, message = "must be 6 to 128 characters"))]
    pub new_password: String,
}

/// Authentication response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
