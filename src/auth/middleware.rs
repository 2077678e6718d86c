// Authentication middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{Principal, Role},
    token::{token_fingerprint, TokenService},
};

/// Extract the bearer token from the Authorization header
///
/// Returns `Ok(None)` when the header is absent, `InvalidToken` when it is
/// present but not a non-empty `Bearer` credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Some(token)),
        _ => Err(AuthError::InvalidToken),
    }
}

fn resolve_principal(headers: &HeaderMap, tokens: &TokenService) -> Result<Principal, AuthError> {
    let token = bearer_token(headers)?.ok_or(AuthError::MissingToken)?;
    let claims = tokens.verify(token).map_err(|e| {
        debug!("Rejected token {}: {}", token_fingerprint(token), e);
        e
    })?;
    Ok(claims.into())
}

/// Authenticated user extractor for protected routes
///
/// Resolves the principal from a verified bearer token on every request.
/// When an upstream `require_role` layer already resolved it, the request
/// extension is reused.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(Self(principal.clone()));
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        resolve_principal(&parts.headers, &tokens).map(Self)
    }
}

/// Authorization layer state requiring a minimum role
///
/// Used with `axum::middleware::from_fn_with_state` and [`require_role`].
#[derive(Clone)]
pub struct RequireRole {
    required_role: Role,
    tokens: Arc<TokenService>,
}

impl RequireRole {
    /// Create a new RequireRole with the specified role requirement
    pub fn new(required_role: Role, tokens: Arc<TokenService>) -> Self {
        Self {
            required_role,
            tokens,
        }
    }

    /// Require an administrator (admin or super admin)
    pub fn admin(tokens: Arc<TokenService>) -> Self {
        Self::new(Role::Admin, tokens)
    }

    pub fn required_role(&self) -> Role {
        self.required_role
    }

    /// Resolve the principal and check its role
    pub fn check(&self, headers: &HeaderMap, endpoint: &str) -> Result<Principal, AuthError> {
        let principal = resolve_principal(headers, &self.tokens).map_err(|e| {
            warn!("Authentication failed for protected endpoint {}: {}", endpoint, e);
            e
        })?;

        principal.require(self.required_role).map_err(|e| {
            warn!(
                "Authorization failed: user_id={}, required_role={}, actual_role={}, endpoint={}",
                principal.user_id, self.required_role, principal.role, endpoint
            );
            e
        })?;

        debug!(
            "Authorization successful: user_id={}, role={}, endpoint={}",
            principal.user_id, principal.role, endpoint
        );
        Ok(principal)
    }
}

/// Middleware function that validates role-based access
///
/// The resolved [`Principal`] is stored in the request extensions for the
/// handlers behind the layer.
pub async fn require_role(
    State(guard): State<RequireRole>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = guard.check(request.headers(), request.uri().path())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use crate::auth::token::Claims;
    use axum::{
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use proptest::prelude::*;
    use tower::ServiceExt;

    fn test_token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new("test_secret_key_for_testing_purposes", 30))
    }

    fn test_user(role: Role) -> User {
        User {
            id: 7,
            username: "editor".to_string(),
            email: "editor@example.com".to_string(),
            name: None,
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    // Helper to create test parts with an optional Authorization header
    fn create_parts(auth_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Ok(None)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));

        for invalid in ["Basic dXNlcjpwYXNz", "Bearer ", "abc.def", ""] {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(invalid));
            assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidToken)));
        }
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let tokens = test_token_service();
        let token = tokens.issue(&test_user(Role::User)).unwrap();
        let mut parts = create_parts(Some(&format!("Bearer {}", token)));

        let AuthenticatedUser(principal) =
            AuthenticatedUser::from_request_parts(&mut parts, &tokens).await.unwrap();
        assert_eq!(principal.user_id, 7);
        assert_eq!(principal.username, "editor");
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let tokens = test_token_service();
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: "editor".to_string(),
                user_id: 7,
                role: Role::User,
                iat: now - 1000,
                exp: now - 500,
                jti: "expired".to_string(),
            })
            .unwrap();
        let mut parts = create_parts(Some(&format!("Bearer {}", token)));

        let result = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await;
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_missing_authorization_header() {
        let tokens = test_token_service();
        let mut parts = create_parts(None);

        let result = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_principal_from_extensions_is_reused() {
        let tokens = test_token_service();
        let mut parts = create_parts(None);
        parts.extensions.insert(Principal {
            user_id: 3,
            username: "cached".to_string(),
            role: Role::Admin,
        });

        let AuthenticatedUser(principal) =
            AuthenticatedUser::from_request_parts(&mut parts, &tokens).await.unwrap();
        assert_eq!(principal.user_id, 3);
    }

    #[test]
    fn test_require_role_check() {
        let tokens = test_token_service();
        let guard = RequireRole::admin(tokens.clone());

        for (role, allowed) in [(Role::User, false), (Role::Admin, true), (Role::SuperAdmin, true)] {
            let token = tokens.issue(&test_user(role)).unwrap();
            let mut headers = HeaderMap::new();
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );

            match guard.check(&headers, "/api/admin/users") {
                Ok(principal) => {
                    assert!(allowed);
                    assert_eq!(principal.role, role);
                }
                Err(AuthError::InsufficientPermissions { required, actual }) => {
                    assert!(!allowed);
                    assert_eq!(required, Role::Admin);
                    assert_eq!(actual, role);
                }
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }
    }

    fn guarded_app(tokens: Arc<TokenService>) -> Router {
        Router::new()
            .route(
                "/guarded",
                get(|AuthenticatedUser(principal): AuthenticatedUser| async move {
                    principal.username
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                RequireRole::admin(tokens.clone()),
                require_role,
            ))
            .with_state(tokens)
    }

    #[tokio::test]
    async fn test_require_role_layer_statuses() {
        let tokens = test_token_service();
        let admin_token = tokens.issue(&test_user(Role::Admin)).unwrap();
        let user_token = tokens.issue(&test_user(Role::User)).unwrap();

        let cases = [
            (None, StatusCode::UNAUTHORIZED),
            (Some(user_token), StatusCode::FORBIDDEN),
            (Some(admin_token), StatusCode::OK),
        ];

        for (token, expected) in cases {
            let mut request = Request::builder().uri("/guarded");
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let response = guarded_app(tokens.clone())
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    proptest! {
        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let tokens = test_token_service();
            let mut parts = create_parts(Some(&format!("Bearer {}", malformed)));

            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(AuthenticatedUser::from_request_parts(&mut parts, &tokens));

            prop_assert!(matches!(result, Err(AuthError::InvalidToken)));
        }
    }
}
