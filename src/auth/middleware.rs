// Authentication middleware and extractors for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, token::TokenService};

/// Identity of the caller, attached to request extensions by the auth gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
}

/// Pull the bearer token out of the Authorization header
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

/// Resolve the caller from the request headers
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.validate(token)?;
    Ok(AuthContext {
        user_id: claims.sub,
        username: claims.username,
    })
}

/// Mandatory auth gate
///
/// Rejects with 401 unless the request carries a valid bearer token.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let context = authenticate(&tokens, request.headers()).map_err(|e| {
        warn!("Rejected request to protected endpoint {}: {}", endpoint, e);
        e
    })?;

    debug!(
        "Authenticated user_id={}, username={}, endpoint={}",
        context.user_id, context.username, endpoint
    );
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Optional auth gate
///
/// Attaches the caller identity when a valid token is present and otherwise
/// lets the request through anonymously. Never rejects.
pub async fn optional_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&tokens, request.headers()) {
        Ok(context) => {
            request.extensions_mut().insert(context);
        }
        Err(AuthError::MissingToken) => {}
        Err(e) => debug!("Ignoring unusable token on public endpoint: {}", e),
    }
    next.run(request).await
}

/// Extractor for handlers behind `require_auth`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingToken)
    }
}

/// Extractor for handlers behind `optional_auth`
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::HeaderValue;

    fn test_token_service() -> TokenService {
        TokenService::new(&JwtConfig::new("test_secret_key_for_testing_purposes"))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token_yields_context() {
        let tokens = test_token_service();
        let token = tokens.issue(7, "alice").unwrap();

        let context = authenticate(&tokens, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(
            context,
            AuthContext {
                user_id: 7,
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_missing_header() {
        let tokens = test_token_service();
        assert!(matches!(
            authenticate(&tokens, &HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_malformed_headers() {
        let tokens = test_token_service();
        let token = tokens.issue(1, "alice").unwrap();

        for value in [
            token.clone(),
            format!("Basic {}", token),
            format!("bearer {}", token),
            "Bearer ".to_string(),
            "Basic dXNlcjpwYXNz".to_string(),
        ] {
            assert!(
                matches!(authenticate(&tokens, &headers_with(&value)), Err(AuthError::InvalidToken)),
                "header {:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_non_utf8_header() {
        let tokens = test_token_service();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert!(matches!(authenticate(&tokens, &headers), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_token_from_other_secret() {
        let other = TokenService::new(&JwtConfig::new("a_completely_different_secret_value"));
        let token = other.issue(1, "mallory").unwrap();

        let tokens = test_token_service();
        assert!(matches!(
            authenticate(&tokens, &headers_with(&format!("Bearer {}", token))),
            Err(AuthError::InvalidToken)
        ));
    }

    /// Router whose only handler counts how often it was reached
    fn gated_router(
        tokens: Arc<TokenService>,
        hits: Arc<std::sync::atomic::AtomicUsize>,
        mandatory: bool,
    ) -> axum::Router {
        use axum::{middleware::from_fn_with_state, routing::get, Router};
        use std::sync::atomic::Ordering;

        let handler = move |MaybeUser(caller): MaybeUser| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                caller.map(|c| c.username).unwrap_or_else(|| "anonymous".to_string())
            }
        };
        let router = Router::new().route("/", get(handler));
        if mandatory {
            router.route_layer(from_fn_with_state(tokens, require_auth))
        } else {
            router.route_layer(from_fn_with_state(tokens, optional_auth))
        }
    }

    fn request_with(value: Option<&str>) -> axum::http::Request<axum::body::Body> {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_mandatory_gate_stops_before_handler() {
        use axum::http::StatusCode;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tower::ServiceExt;

        let tokens = Arc::new(test_token_service());
        let hits = Arc::new(AtomicUsize::new(0));
        let token = tokens.issue(1, "alice").unwrap();

        for value in [None, Some("Basic abc"), Some("Bearer "), Some("Bearer nope")] {
            let response = gated_router(tokens.clone(), hits.clone(), true)
                .oneshot(request_with(value))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let bearer = format!("Bearer {}", token);
        let response = gated_router(tokens.clone(), hits.clone(), true)
            .oneshot(request_with(Some(&bearer)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_optional_gate_always_reaches_handler() {
        use axum::http::StatusCode;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tower::ServiceExt;

        let tokens = Arc::new(test_token_service());
        let hits = Arc::new(AtomicUsize::new(0));

        for value in [None, Some("Basic abc"), Some("Bearer nope")] {
            let response = gated_router(tokens.clone(), hits.clone(), false)
                .oneshot(request_with(value))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_current_user_requires_context() {
        let request = axum::http::Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(CurrentUser::from_request_parts(&mut parts, &()).await.is_err());

        parts.extensions.insert(AuthContext {
            user_id: 3,
            username: "carol".to_string(),
        });
        let CurrentUser(context) = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(context.user_id, 3);

        let MaybeUser(maybe) = MaybeUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(maybe.map(|c| c.username), Some("carol".to_string()));
    }
}
