// Client-side request and response shapes

use serde::{Deserialize, Serialize};
use validator::Validate;

/// User as seen by the client; tolerant of servers that omit optional fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl ClientUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.as_deref(), Some("admin" | "super_admin"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: ClientUser,
}

/// Login form; only presence is checked before the request is sent
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Registration form, checked client-side with the server's rules
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(custom = "crate::validation::validate_username")]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(custom = "crate::validation::validate_strong_password")]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Name must be no more than 100 characters long."))]
    pub name: Option<String>,
}

impl RegisterForm {
    /// Field order used when picking the message to show
    pub const FIELDS: [&'static str; 4] = ["username", "email", "password", "name"];

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}
