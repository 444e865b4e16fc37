// Authentication module
// Provides password hashing, JWT issuance, the auth gates and account endpoints

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{optional_auth, require_auth, AuthContext, CurrentUser, MaybeUser};
pub use repository::{PgUserRepository, UserRepository};
pub use service::AuthService;
pub use token::TokenService;
