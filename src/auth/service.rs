// Authentication service - business logic layer

use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    models::{
        AuthResponse, ChangePasswordRequest, LoginRequest, NewUser, RegisterRequest,
        UpdateProfileRequest, UserResponse, UserStatus,
    },
    password::PasswordService,
    repository::UserRepository,
    token::TokenService,
};

/// Authentication service coordinating registration, login and account changes
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user
    ///
    /// The password is hashed here, before anything is persisted.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        if self.users.username_exists(&request.username).await? {
            tracing::warn!("Registration rejected, username taken: {}", request.username);
            return Err(AuthError::UsernameTaken);
        }
        if self.users.email_exists(&request.email).await? {
            tracing::warn!("Registration rejected, email taken: {}", request.email);
            return Err(AuthError::EmailTaken);
        }

        let password_hash = PasswordService::hash_password_blocking(request.password).await?;

        let user = self
            .users
            .create(NewUser {
                username: request.username,
                password_hash,
                email: request.email,
                nickname: request.nickname.unwrap_or_default(),
            })
            .await?;

        let token = self.tokens.issue(user.id, &user.username)?;

        tracing::info!("User registered: id={}, username={}", user.id, user.username);
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Login with username (or email) and password
    ///
    /// Unknown account and wrong password produce the same error. The account
    /// status is only revealed to a caller who knows the password.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = match self.users.find_by_login(&request.username).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login failed, unknown user: {}", request.username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !PasswordService::verify_password_blocking(request.password, user.password_hash.clone()).await {
            tracing::warn!("Login failed, wrong password: user_id={}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if user.status != UserStatus::Active {
            tracing::warn!("Login attempt on disabled account: user_id={}", user.id);
            return Err(AuthError::AccountDisabled);
        }

        let token = self.tokens.issue(user.id, &user.username)?;

        tracing::info!("User logged in: id={}, username={}", user.id, user.username);
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Get the profile of the authenticated user
    pub async fn profile(&self, user_id: i64) -> Result<UserResponse, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound(user_id))
    }

    /// Update nickname / avatar / bio; blank fields are left untouched
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .update_profile(user_id, request.into_changes())
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;

        tracing::info!("Profile updated: user_id={}", user_id);
        Ok(user.into())
    }

    /// Replace the password after verifying the current one
    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;

        if !PasswordService::verify_password_blocking(request.old_password, user.password_hash).await {
            tracing::warn!("Password change rejected, old password mismatch: user_id={}", user_id);
            return Err(AuthError::WrongPassword);
        }

        let password_hash = PasswordService::hash_password_blocking(request.new_password).await?;
        if !self.users.update_password_hash(user_id, &password_hash).await? {
            return Err(AuthError::UserNotFound(user_id));
        }

        tracing::info!("Password changed: user_id={}", user_id);
        Ok(())
    }
}
