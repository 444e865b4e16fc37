// Database repository for comments and post comment counts

use async_trait::async_trait;
use sqlx::PgPool;

use crate::comments::models::{Comment, NewComment};
use crate::pagination::PageRequest;

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.content, cm.post_id, cm.user_id, u.username AS author,
           cm.parent_id, cm.status, cm.created_at, cm.updated_at
    FROM comments cm
    JOIN users u ON u.id = cm.user_id
"#;

/// Persistence operations for comments
///
/// Creating and deleting a comment also moves the parent post's
/// `comment_count`, in the same transaction.
#[async_trait]
pub trait CommentRepository: Send + Sync + 'static {
    async fn create(&self, comment: NewComment) -> Result<Comment, sqlx::Error>;

    /// Active comment by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, sqlx::Error>;

    /// One page of a post's active comments, oldest first, plus their total
    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<(Vec<Comment>, i64), sqlx::Error>;

    /// Mark a comment deleted; `false` if it was not active
    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL-backed comment repository
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (content, post_id, user_id, parent_id, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING id
            "#,
        )
        .bind(&comment.content)
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(comment.parent_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;

        let query = format!("{} WHERE cm.id = $1", COMMENT_SELECT);
        let created = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("{} WHERE cm.id = $1 AND cm.status = 'active'", COMMENT_SELECT);

        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<(Vec<Comment>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND status = 'active'",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "{} WHERE cm.post_id = $1 AND cm.status = 'active' \
             ORDER BY cm.created_at ASC, cm.id ASC \
             LIMIT $2 OFFSET $3",
            COMMENT_SELECT
        );

        let comments = sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((comments, total))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let post_id: Option<i64> = sqlx::query_scalar(
            "UPDATE comments SET status = 'deleted', updated_at = NOW() \
             WHERE id = $1 AND status = 'active' \
             RETURNING post_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(post_id) = post_id else {
            return Ok(false);
        };

        sqlx::query("UPDATE posts SET comment_count = GREATEST(comment_count - 1, 0) WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
