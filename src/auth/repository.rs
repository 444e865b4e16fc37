// Database repository for user accounts

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{
    error::AuthError,
    models::{NewUser, ProfileChanges, User},
};

const USER_COLUMNS: &str =
    "id, username, password_hash, email, nickname, avatar, bio, status, created_at, updated_at";

/// Persistence operations for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a new active user
    ///
    /// Fails with `UsernameTaken` / `EmailTaken` on uniqueness conflicts.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;

    /// Look a user up by username or (case-insensitive) email
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    /// Apply profile changes; `None` if the user does not exist
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>, AuthError>;

    /// Replace the password digest; `false` if the user does not exist
    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AuthError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique-constraint violations on insert to the matching account error
fn map_insert_error(e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return taken_error(db_err.constraint());
        }
    }
    AuthError::DatabaseError(e)
}

/// Both `users_email_key` and `idx_users_email_lower` guard the email
fn taken_error(constraint: Option<&str>) -> AuthError {
    match constraint {
        Some(constraint) if constraint.contains("email") => AuthError::EmailTaken,
        _ => AuthError::UsernameTaken,
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let query = format!(
            "INSERT INTO users (username, password_hash, email, nickname, status) \
             VALUES ($1, $2, $3, $4, 'active') RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(&user.nickname)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AuthError> {
        // An exact username match wins over an email match
        let query = format!(
            "SELECT {} FROM users \
             WHERE username = $1 OR LOWER(email) = LOWER($1) \
             ORDER BY (username = $1) DESC \
             LIMIT 1",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>, AuthError> {
        let query = format!(
            "UPDATE users SET \
                nickname = COALESCE($1, nickname), \
                avatar = COALESCE($2, avatar), \
                bio = COALESCE($3, bio), \
                updated_at = NOW() \
             WHERE id = $4 \
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(changes.nickname)
            .bind(changes.avatar)
            .bind(changes.bio)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violations_map_to_taken_errors() {
        assert!(matches!(taken_error(Some("users_email_key")), AuthError::EmailTaken));
        assert!(matches!(taken_error(Some("idx_users_email_lower")), AuthError::EmailTaken));
        assert!(matches!(taken_error(Some("users_username_key")), AuthError::UsernameTaken));
        assert!(matches!(taken_error(None), AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_email_uniqueness_ignores_case_against_postgres() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = PgPool::connect(&url).await.expect("Failed to connect to test database");
        crate::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let users = PgUserRepository::new(pool);
        let new_user = |username: String, email: String| NewUser {
            username,
            password_hash: "$argon2id$placeholder".to_string(),
            email,
            nickname: String::new(),
        };

        users
            .create(new_user(format!("case_a_{}", suffix), format!("Case_{}@Example.com", suffix)))
            .await
            .unwrap();
        let duplicate = users
            .create(new_user(format!("case_b_{}", suffix), format!("case_{}@example.com", suffix)))
            .await;
        assert!(matches!(duplicate, Err(AuthError::EmailTaken)));
    }
}
