// Posts module
// Handles post authoring, listing, visibility and view counting

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{Post, PostStatus};
pub use repository::{PgPostRepository, PostRepository};
pub use service::PostService;
