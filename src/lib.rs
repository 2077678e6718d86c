// Blog API
// Authentication, edge gating of the admin area, authored-content lifecycle hooks,
// and the client-side session/theme stores that talk to this API.

pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod validation;
pub mod web;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, RequireRole, TokenService, UserStore};
use content::ContentStore;
use lifecycle::LifecycleHooks;
use web::EdgeGate;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::me_handler,
        auth::handlers::logout_handler,
        auth::handlers::list_users_handler,
        content::handlers::list_posts,
        content::handlers::get_post,
        content::handlers::create_post,
        content::handlers::update_post,
        content::handlers::delete_post,
        content::handlers::list_comments,
        content::handlers::create_comment,
        content::handlers::update_comment,
        content::handlers::delete_comment,
        content::handlers::moderate_delete_post,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::UserResponse,
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::AuthResponse,
            lifecycle::Author,
            content::models::Post,
            content::models::Comment,
            content::models::CreatePost,
            content::models::UpdatePost,
            content::models::CreateComment,
            content::models::UpdateComment,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current principal"),
        (name = "posts", description = "Blog posts and their comments"),
        (name = "admin", description = "Moderation endpoints for administrators")
    ),
    info(
        title = "Blog API",
        version = "0.1.0",
        description = "Bearer-token authenticated blogging API"
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
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
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub content: Arc<dyn ContentStore>,
    pub hooks: Arc<LifecycleHooks>,
    pub gate: Arc<EdgeGate>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
        tokens: Arc<TokenService>,
        gate: EdgeGate,
    ) -> Self {
        let auth = Arc::new(AuthService::new(users.clone(), tokens.clone()));
        Self {
            auth,
            tokens,
            users,
            content,
            hooks: Arc::new(LifecycleHooks::default()),
            gate: Arc::new(gate),
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates and configures the application router
///
/// API routes, the admin moderation API (role-gated), the HTML pages, and the
/// edge gate in front of the admin area. `cors_origins` empty means any origin.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let admin_api = Router::new()
        .route("/api/admin/users", get(auth::handlers::list_users_handler))
        .route(
            "/api/admin/posts/:id",
            delete(content::handlers::moderate_delete_post),
        )
        .route_layer(middleware::from_fn_with_state(
            RequireRole::admin(state.tokens.clone()),
            auth::middleware::require_role,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/auth/login",
            get(web::pages::login_page).post(auth::handlers::login_handler),
        )
        .route("/auth/register", post(auth::handlers::register_handler))
        .route("/auth/me", get(auth::handlers::me_handler))
        .route("/auth/logout", post(auth::handlers::logout_handler))
        .route(
            "/posts",
            get(content::handlers::list_posts).post(content::handlers::create_post),
        )
        .route(
            "/posts/:id",
            get(content::handlers::get_post)
                .put(content::handlers::update_post)
                .delete(content::handlers::delete_post),
        )
        .route(
            "/posts/:id/comments",
            get(content::handlers::list_comments).post(content::handlers::create_comment),
        )
        .route(
            "/posts/:id/comments/:comment_id",
            put(content::handlers::update_comment).delete(content::handlers::delete_comment),
        )
        .merge(admin_api)
        .merge(web::pages::router(&state.gate))
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            web::gate::edge_gate,
        ))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

#[cfg(test)]
mod tests;
