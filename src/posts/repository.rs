// Database repository for posts and their tags

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::pagination::PageRequest;
use crate::posts::models::{NewPost, Post, PostChanges};

/// Post columns joined with author, category and tag names
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.excerpt, p.status, p.view_count, p.comment_count,
           p.is_top, p.user_id, u.username AS author, p.category_id, c.name AS category,
           ARRAY(
               SELECT t.name::text FROM post_tags pt
               JOIN tags t ON t.id = pt.tag_id
               WHERE pt.post_id = p.id
               ORDER BY t.name
           ) AS tags,
           p.published_at, p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Persistence operations for posts
///
/// Reads never return soft-deleted rows.
#[async_trait]
pub trait PostRepository: Send + Sync + 'static {
    async fn create(&self, post: NewPost) -> Result<Post, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, sqlx::Error>;

    /// One page of published posts plus the total number of published posts
    async fn list_published(&self, page: PageRequest) -> Result<(Vec<Post>, i64), sqlx::Error>;

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, sqlx::Error>;

    /// Mark a post deleted; `false` if there was nothing to delete
    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error>;

    /// Atomically add `delta` to a published post's view count and return the new value
    async fn increment_view_count(&self, id: i64, delta: i64) -> Result<Option<i64>, sqlx::Error>;

    async fn category_exists(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> Result<Post, sqlx::Error> {
        self.find_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

/// Replace the tag set of a post, creating missing tags on the way
async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    tags: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    for name in tags {
        let tag_id: i64 = sqlx::query_scalar(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, content, excerpt, status, is_top, user_id, category_id, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(post.status)
        .bind(post.is_top)
        .bind(post.user_id)
        .bind(post.category_id)
        .bind(post.published_at)
        .fetch_one(&mut *tx)
        .await?;

        replace_tags(&mut tx, id, &post.tags).await?;
        tx.commit().await?;

        self.fetch(id).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("{} WHERE p.id = $1 AND p.status <> 'deleted'", POST_SELECT);

        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_published(&self, page: PageRequest) -> Result<(Vec<Post>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = 'published'")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "{} WHERE p.status = 'published' \
             ORDER BY p.is_top DESC, p.published_at DESC NULLS LAST, p.id DESC \
             LIMIT $1 OFFSET $2",
            POST_SELECT
        );

        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((posts, total))
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // published_at is only ever set once
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                excerpt = COALESCE($3, excerpt),
                status = COALESCE($4, status),
                is_top = COALESCE($5, is_top),
                category_id = COALESCE($6, category_id),
                published_at = COALESCE(published_at, $7),
                updated_at = NOW()
            WHERE id = $8 AND status <> 'deleted'
            RETURNING id
            "#,
        )
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.excerpt)
        .bind(changes.status)
        .bind(changes.is_top)
        .bind(changes.category_id)
        .bind(changes.published_at)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(tags) = &changes.tags {
            replace_tags(&mut tx, id, tags).await?;
        }
        tx.commit().await?;

        self.fetch(id).await.map(Some)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_view_count(&self, id: i64, delta: i64) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE posts SET view_count = view_count + $1 \
             WHERE id = $2 AND status = 'published' \
             RETURNING view_count",
        )
        .bind(delta)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn category_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.unwrap_or(false))
    }
}
