// User stores: PostgreSQL and in-memory

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::auth::{
    error::AuthError,
    models::{NewUser, User, UserRow},
};

/// Persistence operations the auth service needs
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user; duplicate username or email fails with `AlreadyRegistered`
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Check whether the username or the email is already taken
    async fn username_or_email_exists(&self, username: &str, email: &str)
        -> Result<bool, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;
}

const USER_COLUMNS: &str = "id, username, email, name, password_hash, role, created_at";

/// PostgreSQL-backed user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let sql = format!(
            "INSERT INTO users (username, email, name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.name)
            .bind(&new_user.password_hash)
            .bind(new_user.role.as_str())
            .fetch_one(&self.pool)
            .await?;

        User::try_from(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("LOWER(email) = LOWER($1)", email).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AuthError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR LOWER(email) = LOWER($2))",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

/// In-memory user repository, used without a database and in tests
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        let taken = users.iter().any(|u| {
            u.username == new_user.username || u.email.eq_ignore_ascii_case(&new_user.email)
        });
        if taken {
            return Err(AuthError::AlreadyRegistered);
        }

        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: new_user.username,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AuthError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .any(|u| u.username == username || u.email.eq_ignore_ascii_case(email)))
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.read().await.clone())
    }
}
