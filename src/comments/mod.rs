// Comments module
// Handles commenting on published posts

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{Comment, CommentStatus};
pub use repository::{CommentRepository, PgCommentRepository};
pub use service::CommentService;
