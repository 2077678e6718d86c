use std::sync::Arc;

use blog_api::{
    auth::{InMemoryUserRepository, PgUserRepository, TokenService, UserStore},
    config::AppConfig,
    content::{ContentStore, InMemoryContentRepository, PgContentRepository},
    create_router, db,
    web::EdgeGate,
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Blog API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    let (users, content): (Arc<dyn UserStore>, Arc<dyn ContentStore>) = match &config.database_url
    {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations completed successfully");

            (
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgContentRepository::new(pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryContentRepository::new()),
            )
        }
    };

    let tokens = Arc::new(TokenService::new(
        config.jwt_secret.clone(),
        config.access_token_expire_minutes,
    ));
    let state = AppState::new(
        users,
        content,
        tokens,
        EdgeGate::new(&config.admin_path_prefix),
    );

    if let Some(seed) = &config.admin_seed {
        state
            .auth
            .ensure_admin(&seed.username, &seed.email, &seed.password)
            .await
            .expect("Failed to seed admin account");
    }

    let app = create_router(state, &config.cors_origins);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Blog API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
