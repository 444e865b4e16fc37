// HTTP handlers for post endpoints

use axum::extract::State;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::ApiError;
use crate::pagination::PageQuery;
use crate::posts::models::{CreatePostRequest, Post, PostList, UpdatePostRequest};
use crate::response::ApiResponse;
use crate::validation::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::AppState;

/// List published posts
/// GET /api/v1/posts
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of published posts", body = PostList)
    ),
    tag = "posts"
)]
pub async fn list_posts_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<ApiResponse<PostList>, ApiError> {
    let list = state.posts.list(&query).await?;
    Ok(ApiResponse::success(list, "success"))
}

/// Get a single post
/// GET /api/v1/posts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "The post, with its view counted", body = Post),
        (status = 404, description = "Post missing, deleted, or a draft of someone else")
    ),
    tag = "posts"
)]
pub async fn get_post_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<ApiResponse<Post>, ApiError> {
    let post = state.posts.get(id, viewer.as_ref()).await?;
    Ok(ApiResponse::success(post, "success"))
}

/// Create a post
/// POST /api/v1/posts
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = Post),
        (status = 400, description = "Invalid input or unknown category"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> Result<ApiResponse<Post>, ApiError> {
    let post = state.posts.create(&caller, request).await?;
    Ok(ApiResponse::success(post, "post created"))
}

/// Update a post
/// PUT /api/v1/posts/{id}
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 400, description = "Invalid input or unknown category"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdatePostRequest>,
) -> Result<ApiResponse<Post>, ApiError> {
    let post = state.posts.update(id, &caller, request).await?;
    Ok(ApiResponse::success(post, "post updated"))
}

/// Delete a post
/// DELETE /api/v1/posts/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.posts.delete(id, &caller).await?;
    Ok(ApiResponse::ok("post deleted"))
}
