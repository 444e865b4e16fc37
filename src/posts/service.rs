// Post business logic: visibility, ownership and view counting

use std::sync::Arc;

use chrono::Utc;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{PageQuery, PageRequest, Pagination};
use crate::posts::models::{
    auto_excerpt, normalize_tags, CreatePostRequest, NewPost, Post, PostChanges, PostList,
    PostStatus, UpdatePostRequest,
};
use crate::posts::repository::PostRepository;

/// Default page size for post listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Service layer for post business logic
#[derive(Clone)]
pub struct PostService {
    repository: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }

    /// One page of published posts, pinned posts first
    pub async fn list(&self, query: &PageQuery) -> Result<PostList, ApiError> {
        let page = PageRequest::from_query(query, DEFAULT_PAGE_SIZE);
        let (posts, total) = self.repository.list_published(page).await?;

        tracing::debug!("Listed {} of {} published posts (page {})", posts.len(), total, page.page);
        Ok(PostList {
            posts,
            pagination: Pagination::new(page, total),
        })
    }

    /// Fetch a post for display
    ///
    /// Drafts are only visible to their author. Viewing a published post
    /// counts as one view.
    pub async fn get(&self, id: i64, viewer: Option<&AuthContext>) -> Result<Post, ApiError> {
        let mut post = self.visible_post(id, viewer.map(|v| v.user_id)).await?;

        if post.status == PostStatus::Published {
            if let Some(view_count) = self.repository.increment_view_count(id, 1).await? {
                post.view_count = view_count;
            }
        }

        Ok(post)
    }

    /// Create a post owned by `author`
    pub async fn create(&self, author: &AuthContext, request: CreatePostRequest) -> Result<Post, ApiError> {
        let status = request.status.unwrap_or_default();
        ensure_writable_status(status)?;
        if let Some(category_id) = request.category_id {
            self.ensure_category(category_id).await?;
        }

        let excerpt = match request.excerpt.filter(|e| !e.trim().is_empty()) {
            Some(excerpt) => excerpt,
            None => auto_excerpt(&request.content),
        };

        let post = self
            .repository
            .create(NewPost {
                title: request.title,
                content: request.content,
                excerpt,
                status,
                is_top: request.is_top.unwrap_or(false),
                user_id: author.user_id,
                category_id: request.category_id,
                tags: normalize_tags(request.tags.unwrap_or_default()),
                published_at: (status == PostStatus::Published).then(Utc::now),
            })
            .await?;

        tracing::info!("Post created: id={}, user_id={}, status={:?}", post.id, author.user_id, status);
        Ok(post)
    }

    /// Update a post; only its author may do so
    pub async fn update(
        &self,
        id: i64,
        caller: &AuthContext,
        request: UpdatePostRequest,
    ) -> Result<Post, ApiError> {
        let existing = self.owned_post(id, caller, "update").await?;

        if let Some(status) = request.status {
            ensure_writable_status(status)?;
        }
        if let Some(category_id) = request.category_id {
            self.ensure_category(category_id).await?;
        }

        let excerpt = match request.excerpt.filter(|e| !e.trim().is_empty()) {
            Some(excerpt) => Some(excerpt),
            None if existing.excerpt.is_empty() => request.content.as_deref().map(auto_excerpt),
            None => None,
        };
        let publishing = request.status.unwrap_or(existing.status) == PostStatus::Published;

        let changes = PostChanges {
            title: request.title,
            content: request.content,
            excerpt,
            status: request.status,
            is_top: request.is_top,
            category_id: request.category_id,
            tags: request.tags.map(normalize_tags),
            published_at: publishing.then(Utc::now),
        };

        let post = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;

        tracing::info!("Post updated: id={}, user_id={}", id, caller.user_id);
        Ok(post)
    }

    /// Soft-delete a post; only its author may do so
    pub async fn delete(&self, id: i64, caller: &AuthContext) -> Result<(), ApiError> {
        self.owned_post(id, caller, "delete").await?;

        if !self.repository.soft_delete(id).await? {
            return Err(ApiError::not_found("post", id));
        }

        tracing::info!("Post deleted: id={}, user_id={}", id, caller.user_id);
        Ok(())
    }

    async fn visible_post(&self, id: i64, viewer: Option<i64>) -> Result<Post, ApiError> {
        match self.repository.find_by_id(id).await? {
            Some(post) if post.is_visible_to(viewer) => Ok(post),
            _ => {
                tracing::debug!("Post {} not visible to {:?}", id, viewer);
                Err(ApiError::not_found("post", id))
            }
        }
    }

    async fn owned_post(&self, id: i64, caller: &AuthContext, action: &str) -> Result<Post, ApiError> {
        let post = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", id))?;

        if post.user_id != caller.user_id {
            tracing::warn!(
                "User {} attempted to {} post {} owned by {}",
                caller.user_id,
                action,
                id,
                post.user_id
            );
            return Err(ApiError::Forbidden(format!("not allowed to {} this post", action)));
        }

        Ok(post)
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), ApiError> {
        if self.repository.category_exists(category_id).await? {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!("category {} does not exist", category_id)))
        }
    }
}

fn ensure_writable_status(status: PostStatus) -> Result<(), ApiError> {
    if status == PostStatus::Deleted {
        return Err(ApiError::BadRequest("status must be draft or published".to_string()));
    }
    Ok(())
}
