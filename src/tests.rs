// Router-level tests for the Blog API
// Exercise the full stack (routes, extractors, hooks, gate) over the in-memory stores

use super::*;
use auth::{InMemoryUserRepository, UserResponse};
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use content::{InMemoryContentRepository, Post};
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

const PASSWORD: &str = "Passw0rd";

/// Helper function to create a test server with a seeded admin account
async fn create_test_server() -> TestServer {
    let tokens = Arc::new(TokenService::new("test-secret", 30));
    let state = AppState::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryContentRepository::new()),
        tokens,
        EdgeGate::default(),
    );
    state
        .auth
        .ensure_admin("admin", "admin@example.com", PASSWORD)
        .await
        .unwrap();

    TestServer::new(create_router(state, &[])).unwrap()
}

fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Register an account and return its access token
async fn register_and_login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    login(server, username).await
}

async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({"username": username, "password": PASSWORD}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_post(server: &TestServer, token: &str, title: &str) -> Post {
    let response = bearer(server.post("/posts"), token)
        .json(&json!({"title": title, "content": "Body text"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_register_login_and_me() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;

    let response = bearer(server.get("/auth/me"), &token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let me: UserResponse = response.json();
    assert_eq!(me.username, "alice");
    assert_eq!(me.email, "alice@example.com");
}

#[tokio::test]
async fn test_login_accepts_email() {
    let server = create_test_server().await;
    register_and_login(&server, "alice").await;

    let response = server
        .post("/auth/login")
        .json(&json!({"username": "alice@example.com", "password": PASSWORD}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let server = create_test_server().await;
    register_and_login(&server, "alice").await;

    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_registration_is_unprocessable() {
    let server = create_test_server().await;

    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "not-an-email",
            "password": PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = create_test_server().await;
    register_and_login(&server, "alice").await;

    let response = server
        .post("/auth/login")
        .json(&json!({"username": "alice", "password": "Wr0ngPass"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_without_token_challenges() {
    let server = create_test_server().await;

    let response = server.get("/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");

    let response = bearer(server.get("/auth/me"), "garbage").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_token() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;

    assert_eq!(
        server.post("/auth/logout").await.status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        bearer(server.post("/auth/logout"), &token).await.status_code(),
        StatusCode::NO_CONTENT
    );
}

// ============================================================================
// Role Gate Tests
// ============================================================================

#[tokio::test]
async fn test_admin_api_requires_admin_role() {
    let server = create_test_server().await;
    let user_token = register_and_login(&server, "alice").await;
    let admin_token = login(&server, "admin").await;

    assert_eq!(
        server.get("/api/admin/users").await.status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        bearer(server.get("/api/admin/users"), &user_token)
            .await
            .status_code(),
        StatusCode::FORBIDDEN
    );

    let response = bearer(server.get("/api/admin/users"), &admin_token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let users: Vec<UserResponse> = response.json();
    assert_eq!(users.len(), 2);
}

// ============================================================================
// Content Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_create_post_stamps_author_and_date() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;

    let post = create_post(&server, &token, "Hello World").await;
    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.author.as_ref().unwrap().username, "alice");
    assert!(post.published.is_some());

    let fetched: Post = server.get(&format!("/posts/{}", post.id)).await.json();
    assert_eq!(fetched, post);
}

#[tokio::test]
async fn test_create_post_requires_token() {
    let server = create_test_server().await;

    let response = server
        .post("/posts")
        .json(&json!({"title": "Hello", "content": "Body"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_keeps_author_and_date() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;
    let post = create_post(&server, &token, "Hello World").await;

    let response = bearer(server.put(&format!("/posts/{}", post.id)), &token)
        .json(&json!({"title": "Edited"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let updated: Post = response.json();
    assert_eq!(updated.title, "Edited");
    assert_eq!(updated.author, post.author);
    assert_eq!(updated.published, post.published);
}

#[tokio::test]
async fn test_only_owner_or_admin_may_modify() {
    let server = create_test_server().await;
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;
    let admin = login(&server, "admin").await;
    let post = create_post(&server, &alice, "Hello World").await;
    let path = format!("/posts/{}", post.id);

    let response = bearer(server.put(&path), &bob)
        .json(&json!({"title": "Hijacked"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    assert_eq!(
        bearer(server.delete(&path), &bob).await.status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        bearer(server.delete(&path), &admin).await.status_code(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(server.get(&path).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;
    create_post(&server, &token, "Hello World").await;

    let response = bearer(server.post("/posts"), &token)
        .json(&json!({"title": "Hello, world!", "content": "Again"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_comments_require_token_and_stamp_author() {
    let server = create_test_server().await;
    let token = register_and_login(&server, "alice").await;
    let post = create_post(&server, &token, "Hello World").await;
    let path = format!("/posts/{}/comments", post.id);

    let response = bearer(server.post(&path), &token)
        .json(&json!({"content": "First!"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let signed: Value = response.json();
    assert_eq!(signed["author"]["username"], "alice");
    assert!(signed["published"].is_string());

    let response = server.post(&path).json(&json!({"content": "No token"})).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let comments: Vec<Value> = server.get(&path).await.json();
    assert_eq!(comments.len(), 1);

    assert_eq!(
        server.get("/posts/999/comments").await.status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_comment_edit_keeps_author_and_date() {
    let server = create_test_server().await;
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;
    let post = create_post(&server, &alice, "Hello World").await;

    let created: Value = bearer(server.post(&format!("/posts/{}/comments", post.id)), &bob)
        .json(&json!({"content": "Nice post"}))
        .await
        .json();
    let path = format!("/posts/{}/comments/{}", post.id, created["id"]);

    let response = bearer(server.put(&path), &alice)
        .json(&json!({"content": "Rewritten by someone else"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = bearer(server.put(&path), &bob)
        .json(&json!({"content": "Very nice post"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["content"], "Very nice post");
    assert_eq!(updated["author"], created["author"]);
    assert_eq!(updated["published"], created["published"]);

    let response = bearer(server.put(&path), &bob)
        .json(&json!({"content": ""}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let elsewhere = format!("/posts/{}/comments/{}", post.id + 1, created["id"]);
    assert_eq!(
        bearer(server.delete(&elsewhere), &bob).await.status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_comment_delete_by_author_or_admin() {
    let server = create_test_server().await;
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;
    let admin = login(&server, "admin").await;
    let post = create_post(&server, &alice, "Hello World").await;
    let comments = format!("/posts/{}/comments", post.id);

    let mut paths = Vec::new();
    for text in ["One", "Two"] {
        let created: Value = bearer(server.post(&comments), &bob)
            .json(&json!({"content": text}))
            .await
            .json();
        paths.push(format!("{}/{}", comments, created["id"]));
    }

    assert_eq!(
        bearer(server.delete(&paths[0]), &alice).await.status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        bearer(server.delete(&paths[0]), &bob).await.status_code(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        bearer(server.delete(&paths[1]), &admin).await.status_code(),
        StatusCode::NO_CONTENT
    );

    let remaining: Vec<Value> = server.get(&comments).await.json();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_admin_moderation_delete() {
    let server = create_test_server().await;
    let alice = register_and_login(&server, "alice").await;
    let admin = login(&server, "admin").await;
    let post = create_post(&server, &alice, "Hello World").await;
    let path = format!("/api/admin/posts/{}", post.id);

    assert_eq!(
        bearer(server.delete(&path), &alice).await.status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        bearer(server.delete(&path), &admin).await.status_code(),
        StatusCode::NO_CONTENT
    );
}

// ============================================================================
// Edge Gate Tests
// ============================================================================

const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 Mobile Safari/537.36";

fn browser(request: TestRequest, user_agent: &'static str) -> TestRequest {
    request.add_header(header::USER_AGENT, HeaderValue::from_static(user_agent))
}

#[tokio::test]
async fn test_gate_redirects_anonymous_visitor_to_login() {
    let server = create_test_server().await;

    let response = browser(server.get("/admin"), DESKTOP_UA).await;
    assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.header(header::LOCATION),
        "/auth/login?redirect=%2Fadmin"
    );

    let page = server
        .get("/auth/login")
        .add_query_param("redirect", "/admin")
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert!(page.text().contains("/admin"));
}

#[tokio::test]
async fn test_gate_blocks_mobile_even_with_token() {
    let server = create_test_server().await;
    let admin = login(&server, "admin").await;

    let response = bearer(browser(server.get("/admin"), ANDROID_UA), &admin).await;
    assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header(header::LOCATION), "/admin/mobile-blocked");

    let blocked = browser(server.get("/admin/mobile-blocked"), ANDROID_UA).await;
    assert_eq!(blocked.status_code(), StatusCode::OK);
    assert!(blocked.text().contains("Desktop Access Required"));
}

#[tokio::test]
async fn test_gate_blocks_non_desktop_clients() {
    let server = create_test_server().await;
    let admin = login(&server, "admin").await;

    for user_agent in ["curl/8.4.0", "python-requests/2.31"] {
        let response = bearer(browser(server.get("/admin"), user_agent), &admin).await;
        assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.header(header::LOCATION), "/admin/mobile-blocked");
    }

    // No user agent header at all
    let response = bearer(server.get("/admin"), &admin).await;
    assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header(header::LOCATION), "/admin/mobile-blocked");
}

#[tokio::test]
async fn test_gate_admits_cookie_token() {
    let server = create_test_server().await;
    let token = login(&server, "admin").await;

    let response = browser(server.get("/admin"), DESKTOP_UA)
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme-mode=dark; access_token={}", token)).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Admin dashboard"));
}

#[tokio::test]
async fn test_gate_ignores_public_paths() {
    let server = create_test_server().await;

    let response = browser(server.get("/posts"), ANDROID_UA).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let posts: Vec<Post> = response.json();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let server = create_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: Value = response.json();
    assert!(doc["paths"]["/auth/login"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
