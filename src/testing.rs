// In-memory repositories and app builders for handler tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;

use crate::auth::{
    error::AuthError,
    models::{NewUser, ProfileChanges, User, UserStatus},
    UserRepository,
};
use crate::comments::{models::NewComment, Comment, CommentRepository, CommentStatus};
use crate::config::JwtConfig;
use crate::pagination::PageRequest;
use crate::posts::{
    models::{NewPost, PostChanges},
    Post, PostRepository, PostStatus,
};
use crate::{create_router, AppState};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    categories: Vec<(i64, String)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, user_id: i64) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn category(&self, category_id: Option<i64>) -> Option<String> {
        category_id.and_then(|id| {
            self.categories
                .iter()
                .find(|(cid, _)| *cid == id)
                .map(|(_, name)| name.clone())
        })
    }
}

/// Shared in-memory store implementing every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn add_category(&self, name: &str) -> i64 {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        tables.categories.push((id, name.to_string()));
        id
    }

    pub fn set_user_status(&self, username: &str, status: UserStatus) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.username == username) {
            user.status = status;
        }
    }

    /// Raw post row, including soft-deleted ones
    pub fn post(&self, id: i64) -> Option<Post> {
        let tables = self.tables.lock().unwrap();
        tables.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn password_hash(&self, username: &str) -> Option<String> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            nickname: user.nickname,
            avatar: String::new(),
            bio: String::new(),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AuthError> {
        let tables = self.tables.lock().unwrap();
        let by_username = tables.users.iter().find(|u| u.username == login);
        let found = by_username.or_else(|| tables.users.iter().find(|u| u.email.eq_ignore_ascii_case(login)));
        Ok(found.cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(nickname) = changes.nickname {
            user.nickname = nickname;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let created = Post {
            id: tables.next_id(),
            author: tables.username(post.user_id),
            category: tables.category(post.category_id),
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            status: post.status,
            view_count: 0,
            comment_count: 0,
            is_top: post.is_top,
            user_id: post.user_id,
            category_id: post.category_id,
            tags: post.tags,
            published_at: post.published_at,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id && p.status != PostStatus::Deleted)
            .cloned())
    }

    async fn list_published(&self, page: PageRequest) -> Result<(Vec<Post>, i64), sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut published: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.status == PostStatus::Published)
            .cloned()
            .collect();
        published.sort_by(|a, b| {
            b.is_top
                .cmp(&a.is_top)
                .then(b.published_at.cmp(&a.published_at))
                .then(b.id.cmp(&a.id))
        });

        let total = published.len() as i64;
        let posts = published
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((posts, total))
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let category = tables.category(changes.category_id);
        let Some(post) = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.status != PostStatus::Deleted)
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(status) = changes.status {
            post.status = status;
        }
        if let Some(is_top) = changes.is_top {
            post.is_top = is_top;
        }
        if changes.category_id.is_some() {
            post.category_id = changes.category_id;
            post.category = category;
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        if post.published_at.is_none() {
            post.published_at = changes.published_at;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.status != PostStatus::Deleted)
        {
            Some(post) => {
                post.status = PostStatus::Deleted;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_view_count(&self, id: i64, delta: i64) -> Result<Option<i64>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.status == PostStatus::Published)
            .map(|post| {
                post.view_count += delta;
                post.view_count
            }))
    }

    async fn category_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter().any(|(cid, _)| *cid == id))
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let created = Comment {
            id: tables.next_id(),
            author: tables.username(comment.user_id),
            content: comment.content,
            post_id: comment.post_id,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            status: CommentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(created.clone());
        if let Some(post) = tables.posts.iter_mut().find(|p| p.id == comment.post_id) {
            post.comment_count += 1;
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .find(|c| c.id == id && c.status == CommentStatus::Active)
            .cloned())
    }

    async fn list_for_post(&self, post_id: i64, page: PageRequest) -> Result<(Vec<Comment>, i64), sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut active: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.status == CommentStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = active.len() as i64;
        let comments = active
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((comments, total))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(comment) = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id && c.status == CommentStatus::Active)
        else {
            return Ok(false);
        };
        comment.status = CommentStatus::Deleted;
        let post_id = comment.post_id;

        if let Some(post) = tables.posts.iter_mut().find(|p| p.id == post_id) {
            post.comment_count = (post.comment_count - 1).max(0);
        }
        Ok(true)
    }
}

/// App state wired to a fresh in-memory store
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let state = AppState::from_repositories(
        store.clone(),
        store.clone(),
        store.clone(),
        &JwtConfig::new(TEST_SECRET),
    );
    (state, store)
}

/// Test server running the full router over a fresh in-memory store
pub fn test_server() -> (TestServer, Arc<MemoryStore>) {
    let (state, store) = memory_state();
    let server = TestServer::new(create_router(state)).unwrap();
    (server, store)
}
