// Application configuration loaded from the environment

use std::collections::HashMap;

use crate::auth::TokenService;

/// Errors raised while reading configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials for the administrator account created at start-up
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Server configuration
///
/// `database_url` is optional: without it the server runs on in-memory stores.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub admin_path_prefix: String,
    pub admin_seed: Option<AdminSeed>,
}

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8080";

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let access_token_expire_minutes = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                        value: raw,
                    })
                }
            },
            None => TokenService::DEFAULT_TTL_MINUTES,
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
            })?,
            None => 8000,
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let raw_prefix = get("ADMIN_PATH_PREFIX").unwrap_or_else(|| "/admin".to_string());
        // Validated after trimming so "/" or "//" cannot collapse to an empty route
        let admin_path_prefix = raw_prefix.trim().trim_end_matches('/').to_string();
        if !admin_path_prefix.starts_with('/') || admin_path_prefix.len() < 2 {
            return Err(ConfigError::Invalid {
                name: "ADMIN_PATH_PREFIX",
                value: raw_prefix,
            });
        }

        let admin_seed = match (get("ADMIN_USERNAME"), get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(email), Some(password)) => Some(AdminSeed {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret,
            access_token_expire_minutes,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            cors_origins,
            admin_path_prefix,
            admin_seed,
        })
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builds a lookup closure over a fixed set of values
pub fn lookup_from(values: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| values.get(key).cloned()
}
