// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, NewUser, Principal, RegisterRequest, Role, UserResponse},
    password::PasswordService,
    repository::UserStore,
    token::TokenService,
};

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new user
    ///
    /// This method:
    /// 1. Validates the request fields
    /// 2. Checks the retyped password, when given
    /// 3. Enforces password strength
    /// 4. Rejects a taken username or email
    /// 5. Hashes the password and stores the user with the `user` role
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        self.create_account(request, Role::User).await
    }

    /// Login a user by username or email
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = match self.users.find_by_username(&request.username).await? {
            Some(user) => Some(user),
            None => self.users.find_by_email(&request.username).await?,
        };

        let Some(user) = user else {
            warn!("Login attempt for unknown user: {}", request.username);
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify_password(&request.password, &user.password_hash)? {
            warn!("Login attempt with wrong password for user_id={}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(&user)?;
        info!("User logged in: user_id={}, role={}", user.id, user.role);

        Ok(AuthResponse::bearer(access_token, user.into()))
    }

    /// Get current user information for a verified principal
    pub async fn current_user(&self, principal: &Principal) -> Result<UserResponse, AuthError> {
        debug!("Loading profile for user_id={}", principal.user_id);

        self.users
            .find_by_id(principal.user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// List every account (admin moderation)
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        Ok(self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect())
    }

    /// Create the configured administrator account unless the username exists
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if self.users.find_by_username(username).await?.is_some() {
            debug!("Admin account '{}' already exists", username);
            return Ok(());
        }

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            retyped_password: None,
            name: None,
        };
        let admin = self.create_account(request, Role::Admin).await?;
        info!("Created admin account: user_id={}", admin.id);
        Ok(())
    }

    async fn create_account(
        &self,
        request: RegisterRequest,
        role: Role,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;

        if let Some(retyped) = &request.retyped_password {
            if retyped != &request.password {
                return Err(AuthError::PasswordMismatch);
            }
        }

        PasswordService::validate_password_strength(&request.password)?;

        if self
            .users
            .username_or_email_exists(&request.username, &request.email)
            .await?
        {
            warn!("Registration with taken username or email: {}", request.username);
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .users
            .create_user(NewUser {
                username: request.username,
                email: request.email,
                name: request.name,
                password_hash,
                role,
            })
            .await?;

        info!("Registered user: user_id={}, username={}", user.id, user.username);
        Ok(user.into())
    }
}
