// Comment business logic: target checks and ownership

use std::sync::Arc;

use crate::auth::AuthContext;
use crate::comments::models::{Comment, CommentList, CreateCommentRequest, NewComment};
use crate::comments::repository::CommentRepository;
use crate::error::ApiError;
use crate::pagination::{PageQuery, PageRequest, Pagination};
use crate::posts::{Post, PostRepository, PostStatus};

/// Default page size for comment listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Service layer for comment business logic
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Active comments of a published post, oldest first
    pub async fn list(&self, post_id: i64, query: &PageQuery) -> Result<CommentList, ApiError> {
        match self.posts.find_by_id(post_id).await? {
            Some(post) if post.status == PostStatus::Published => {}
            _ => return Err(ApiError::not_found("post", post_id)),
        }

        let page = PageRequest::from_query(query, DEFAULT_PAGE_SIZE);
        let (comments, total) = self.comments.list_for_post(post_id, page).await?;

        Ok(CommentList {
            comments,
            pagination: Pagination::new(page, total),
        })
    }

    /// Comment on a published post, optionally replying to another comment
    pub async fn create(
        &self,
        post_id: i64,
        author: &AuthContext,
        request: CreateCommentRequest,
    ) -> Result<Comment, ApiError> {
        let post: Post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| ApiError::not_found("post", post_id))?;

        if post.status != PostStatus::Published {
            return Err(ApiError::BadRequest("post is not open for comments".to_string()));
        }

        if let Some(parent_id) = request.parent_id {
            match self.comments.find_by_id(parent_id).await? {
                Some(parent) if parent.post_id == post_id => {}
                _ => {
                    tracing::debug!("Rejected reply to comment {} on post {}", parent_id, post_id);
                    return Err(ApiError::BadRequest(format!(
                        "parent comment {} does not exist on this post",
                        parent_id
                    )));
                }
            }
        }

        let comment = self
            .comments
            .create(NewComment {
                content: request.content,
                post_id,
                user_id: author.user_id,
                parent_id: request.parent_id,
            })
            .await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, user_id={}",
            comment.id,
            post_id,
            author.user_id
        );
        Ok(comment)
    }

    /// Soft-delete a comment; only its author may do so
    pub async fn delete(&self, id: i64, caller: &AuthContext) -> Result<(), ApiError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("comment", id))?;

        if comment.user_id != caller.user_id {
            tracing::warn!(
                "User {} attempted to delete comment {} owned by {}",
                caller.user_id,
                id,
                comment.user_id
            );
            return Err(ApiError::Forbidden("not allowed to delete this comment".to_string()));
        }

        if !self.comments.soft_delete(id).await? {
            return Err(ApiError::not_found("comment", id));
        }

        tracing::info!("Comment deleted: id={}, user_id={}", id, caller.user_id);
        Ok(())
    }
}
