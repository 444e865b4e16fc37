// Comment data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::pagination::Pagination;
use crate::validation::not_blank;

/// Comment state; `Deleted` is the soft-delete marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Deleted,
}

/// Comment row joined with its author's username
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Comment {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Nice post!")]
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
    #[schema(example = "bob")]
    pub author: String,
    pub parent_id: Option<i64>,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
}

/// Request DTO for commenting on a post
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, max = 1000, message = "must be 1 to 1000 characters"),
        custom = "not_blank"
    )]
    #[schema(example = "Nice post!")]
    pub content: String,
    /// Comment being replied to; must belong to the same post
    pub parent_id: Option<i64>,
}

/// One page of a post's comments
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub pagination: Pagination,
}
