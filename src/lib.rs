pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod response;
pub mod validation;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{
        change_password_handler, login_handler, profile_handler, register_handler,
        update_profile_handler,
    },
    optional_auth, require_auth, AuthService, PgUserRepository, TokenService, UserRepository,
};
use comments::{
    handlers::{create_comment_handler, delete_comment_handler, list_comments_handler},
    CommentRepository, CommentService, PgCommentRepository,
};
use config::JwtConfig;
use posts::{
    handlers::{
        create_post_handler, delete_post_handler, get_post_handler, list_posts_handler,
        update_post_handler,
    },
    PgPostRepository, PostRepository, PostService,
};
use response::ApiResponse;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::profile_handler,
        auth::handlers::update_profile_handler,
        auth::handlers::change_password_handler,
        posts::handlers::list_posts_handler,
        posts::handlers::get_post_handler,
        posts::handlers::create_post_handler,
        posts::handlers::update_post_handler,
        posts::handlers::delete_post_handler,
        comments::handlers::list_comments_handler,
        comments::handlers::create_comment_handler,
        comments::handlers::delete_comment_handler,
    ),
    components(
        schemas(
            HealthStatus,
            pagination::Pagination,
            auth::models::UserStatus,
            auth::models::UserResponse,
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::UpdateProfileRequest,
            auth::models::ChangePasswordRequest,
            auth::models::AuthResponse,
            posts::models::PostStatus,
            posts::models::Post,
            posts::models::PostList,
            posts::models::CreatePostRequest,
            posts::models::UpdatePostRequest,
            comments::models::CommentStatus,
            comments::models::Comment,
            comments::models::CommentList,
            comments::models::CreateCommentRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "user", description = "Profile of the authenticated user"),
        (name = "posts", description = "Blog posts"),
        (name = "comments", description = "Comments on posts"),
        (name = "health", description = "Liveness probe")
    ),
    info(
        title = "Blog API",
        version = "1.0.0",
        description = "Blog backend with users, posts and comments. Every response is wrapped in a {code, message, data} envelope."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// State backed by PostgreSQL repositories
    pub fn new(pool: PgPool, jwt: &JwtConfig) -> Self {
        Self::from_repositories(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgPostRepository::new(pool.clone())),
            Arc::new(PgCommentRepository::new(pool)),
            jwt,
        )
    }

    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        jwt: &JwtConfig,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(jwt));
        Self {
            auth: Arc::new(AuthService::new(users, tokens.clone())),
            posts: Arc::new(PostService::new(posts.clone())),
            comments: Arc::new(CommentService::new(comments, posts)),
            tokens,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: &'static str,
}

/// Liveness probe
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up", body = HealthStatus)),
    tag = "health"
)]
async fn health_handler() -> ApiResponse<HealthStatus> {
    ApiResponse::success(HealthStatus { status: "ok" }, "success")
}

async fn fallback_handler() -> ApiResponse<()> {
    ApiResponse::error(StatusCode::NOT_FOUND, "route not found")
}

/// Creates and configures the application router
///
/// Routes are grouped by the auth gate in front of them: none, optional
/// (identity attached when present) or mandatory (401 without a valid token).
/// Gates wrap method handlers only, so unsupported methods still get 405.
pub fn create_router(state: AppState) -> Router {
    let optional_gate = middleware::from_fn_with_state(state.tokens.clone(), optional_auth);
    let mandatory_gate = middleware::from_fn_with_state(state.tokens.clone(), require_auth);

    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/posts", get(list_posts_handler))
        .route("/posts/:id/comments", get(list_comments_handler));

    let optional = Router::new().route("/posts/:id", get(get_post_handler).route_layer(optional_gate));

    let protected = Router::new()
        .route(
            "/user/profile",
            get(profile_handler)
                .put(update_profile_handler)
                .route_layer(mandatory_gate.clone()),
        )
        .route("/user/password", put(change_password_handler).route_layer(mandatory_gate.clone()))
        .route("/posts", post(create_post_handler).route_layer(mandatory_gate.clone()))
        .route(
            "/posts/:id",
            put(update_post_handler)
                .delete(delete_post_handler)
                .route_layer(mandatory_gate.clone()),
        )
        .route("/posts/:id/comments", post(create_comment_handler).route_layer(mandatory_gate.clone()))
        .route("/comments/:id", delete(delete_comment_handler).route_layer(mandatory_gate));

    let api = Router::new().merge(public).merge(optional).merge(protected);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
