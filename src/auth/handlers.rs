// HTTP handlers for authentication and profile endpoints

use axum::extract::State;

use crate::auth::{
    middleware::CurrentUser,
    models::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
        UserResponse,
    },
};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::validation::ValidatedJson;
use crate::AppState;

/// Register a new user
/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered; data carries token and user", body = AuthResponse),
        (status = 400, description = "Invalid input, or username/email already taken")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    tracing::debug!("Registering user: {}", request.username);
    let auth = state.auth.register(request).await?;
    Ok(ApiResponse::success(auth, "registered"))
}

/// Login with username or email
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded; data carries token and user", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Wrong credentials or disabled account")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let auth = state.auth.login(request).await?;
    Ok(ApiResponse::success(auth, "login successful"))
}

/// Current user's profile
/// GET /api/v1/user/profile
#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    responses(
        (status = 200, description = "Profile of the caller", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = state.auth.profile(caller.user_id).await?;
    Ok(ApiResponse::success(user, "success"))
}

/// Update nickname, avatar or bio
/// PUT /api/v1/user/profile
#[utoipa::path(
    put,
    path = "/api/v1/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = state.auth.update_profile(caller.user_id, request).await?;
    Ok(ApiResponse::success(user, "profile updated"))
}

/// Change password
/// PUT /api/v1/user/password
#[utoipa::path(
    put,
    path = "/api/v1/user/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid input or wrong old password"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "user"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state.auth.change_password(caller.user_id, request).await?;
    Ok(ApiResponse::ok("password changed"))
}
