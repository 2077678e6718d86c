// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, info};

use crate::{
    auth::{
        error::AuthError,
        middleware::AuthenticatedUser,
        models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
    },
    AppState,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Weak password, mismatched passwords or already registered", body = String, example = json!({"error": "ALREADY_REGISTERED", "message": "Username or email already registered"})),
        (status = 422, description = "Invalid field values", body = String, example = json!({"error": "VALIDATION_ERROR", "message": "Invalid email format"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    debug!("Registration request for username: {}", request.username);

    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with username (or email) and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = AuthResponse),
        (status = 401, description = "Incorrect username or password", body = String, example = json!({"error": "INVALID_CREDENTIALS", "message": "Incorrect username or password"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    state.auth.login(request).await.map(Json)
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired token", body = String, example = json!({"error": "MISSING_TOKEN", "message": "Missing authentication token"})),
        (status = 404, description = "Account no longer exists", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    state.auth.current_user(&principal).await.map(Json)
}

/// Acknowledge a logout
///
/// Tokens are stateless, so there is nothing to revoke server-side; clients
/// discard their stored token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Missing, invalid or expired token", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(AuthenticatedUser(principal): AuthenticatedUser) -> StatusCode {
    info!("User logged out: user_id={}", principal.user_id);
    StatusCode::NO_CONTENT
}

/// List every registered account
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Administrator role required", body = String, example = json!({"error": "FORBIDDEN", "message": "Insufficient permissions: required role 'admin'"}))
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    state.auth.list_users().await.map(Json)
}
