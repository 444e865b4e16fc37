// HTTP handlers for comment endpoints

use axum::extract::State;

use crate::auth::CurrentUser;
use crate::comments::models::{Comment, CommentList, CreateCommentRequest};
use crate::error::ApiError;
use crate::pagination::PageQuery;
use crate::response::ApiResponse;
use crate::validation::{ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::AppState;

/// List comments of a post
/// GET /api/v1/posts/{id}/comments
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post ID"), PageQuery),
    responses(
        (status = 200, description = "One page of comments, oldest first", body = CommentList),
        (status = 404, description = "Post not found or not published")
    ),
    tag = "comments"
)]
pub async fn list_comments_handler(
    State(state): State<AppState>,
    ValidatedPath(post_id): ValidatedPath<i64>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<ApiResponse<CommentList>, ApiError> {
    let list = state.comments.list(post_id, &query).await?;
    Ok(ApiResponse::success(list, "success"))
}

/// Comment on a post
/// POST /api/v1/posts/{id}/comments
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid input, draft post, or bad parent comment"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn create_comment_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedPath(post_id): ValidatedPath<i64>,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment = state.comments.create(post_id, &caller, request).await?;
    Ok(ApiResponse::success(comment, "comment created"))
}

/// Delete a comment
/// DELETE /api/v1/comments/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.comments.delete(id, &caller).await?;
    Ok(ApiResponse::ok("comment deleted"))
}
