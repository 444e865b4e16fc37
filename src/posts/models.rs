// Post data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::pagination::Pagination;
use crate::validation::{not_blank, validate_tags};

/// Excerpts are generated from content longer than this many characters
pub const EXCERPT_SOURCE_CHARS: usize = 100;

/// Publication state of a post; `Deleted` is the soft-delete marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
    Deleted,
}

/// Post row joined with its author, category and tag names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Post {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Hello, world")]
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub view_count: i64,
    pub comment_count: i64,
    pub is_top: bool,
    pub user_id: i64,
    #[schema(example = "alice")]
    pub author: String,
    pub category_id: Option<i64>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_visible_to(&self, viewer: Option<i64>) -> bool {
        match self.status {
            PostStatus::Published => true,
            PostStatus::Draft => viewer == Some(self.user_id),
            PostStatus::Deleted => false,
        }
    }
}

/// Fields needed to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub is_top: bool,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Post fields to overwrite; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub is_top: Option<bool>,
    pub category_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating a post
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom = "not_blank"
    )]
    #[schema(example = "Hello, world")]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub content: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub excerpt: Option<String>,
    /// draft or published (default)
    pub status: Option<PostStatus>,
    pub is_top: Option<bool>,
    pub category_id: Option<i64>,
    #[validate(length(max = 10, message = "at most 10 tags"), custom = "validate_tags")]
    pub tags: Option<Vec<String>>,
}

/// Request DTO for updating a post; omitted fields are left alone
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom = "not_blank"
    )]
    pub title: Option<String>,
    #[validate(custom = "not_blank")]
    pub content: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub is_top: Option<bool>,
    pub category_id: Option<i64>,
    #[validate(length(max = 10, message = "at most 10 tags"), custom = "validate_tags")]
    pub tags: Option<Vec<String>>,
}

/// One page of published posts
#[derive(Debug, Serialize, ToSchema)]
pub struct PostList {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

/// First 100 characters of `content` plus "...", or empty for short content
pub fn auto_excerpt(content: &str) -> String {
    if content.chars().count() > EXCERPT_SOURCE_CHARS {
        let head: String = content.chars().take(EXCERPT_SOURCE_CHARS).collect();
        format!("{}...", head)
    } else {
        String::new()
    }
}

/// Trim tag names and drop duplicates, keeping first-seen order
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}
