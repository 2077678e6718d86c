// Authentication module
// Bearer-token authentication: registration, login, token verification and role checks

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
pub use middleware::{AuthenticatedUser, RequireRole};
pub use models::{AuthResponse, LoginRequest, Principal, RegisterRequest, Role, User, UserResponse};
pub use repository::{InMemoryUserRepository, PgUserRepository, UserStore};
pub use service::AuthService;
pub use token::TokenService;
