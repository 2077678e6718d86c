// Mock API server for client and session tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const MOCK_TOKEN: &str = "mock-jwt-token";

#[derive(Clone, Default)]
struct Hits(Arc<Mutex<HashMap<String, usize>>>);

/// Mock backend bound to an ephemeral local port
///
/// Accepts `testuser` / `password`, issuing `mock-jwt-token`; `/auth/me`
/// answers 401 unless that token is attached.
pub struct MockApi {
    base_url: String,
    hits: Hits,
}

impl MockApi {
    pub async fn start() -> Self {
        let hits = Hits::default();
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/auth/logout", post(|| async { StatusCode::NO_CONTENT }))
            .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", address),
            hits,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests received for a path
    pub fn hits(&self, path: &str) -> usize {
        self.hits.0.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    *hits
        .0
        .lock()
        .unwrap()
        .entry(request.uri().path().to_string())
        .or_default() += 1;
    next.run(request).await
}

fn mock_user() -> Value {
    json!({"id": 1, "username": "testuser", "email": "test@example.com"})
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "testuser" && body["password"] == "password" {
        Json(json!({
            "access_token": MOCK_TOKEN,
            "token_type": "bearer",
            "user": mock_user(),
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "testuser" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Username already registered"})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({"id": 2, "username": body["username"], "email": body["email"]})),
    )
        .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", MOCK_TOKEN);
    match headers.get(header::AUTHORIZATION) {
        Some(value) if value.as_bytes() == expected.as_bytes() => Json(mock_user()).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        )
            .into_response(),
    }
}
