//! Authentication service
//!
//! Provides business logic for user registration, login, logout, password
//! changes, and token refresh. Coordinates between the user repository, the
//! rotation engine, the password hasher, and the JWT service.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{HasherError, PasswordHasher};
use crate::core::auth::rotation::{RotationEngine, RotationError, TokenPair};
use crate::core::store::models::{CreateUser, UserResponse};
use crate::core::store::repositories::{UserRepository, UserRepositoryError};

/// Name length bounds (characters)
const NAME_MIN: usize = 3;
const NAME_MAX: usize = 15;

/// Last name length bounds (characters)
const LAST_NAME_MIN: usize = 4;
const LAST_NAME_MAX: usize = 15;

/// Email length bounds (characters)
const EMAIL_MIN: usize = 5;
const EMAIL_MAX: usize = 40;

/// Password length bounds (characters)
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 64;

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token reuse detected")]
    TokenReuseDetected,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid name")]
    InvalidName,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 64 characters)")]
    PasswordTooLong,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            other => AuthError::InternalError(other.to_string()),
        }
    }
}

impl From<RotationError> for AuthError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::InvalidToken => AuthError::InvalidToken,
            RotationError::TokenExpired => AuthError::TokenExpired,
            RotationError::TokenReuseDetected => AuthError::TokenReuseDetected,
            RotationError::Internal(msg) => AuthError::InternalError(msg),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<HasherError> for AuthError {
    fn from(err: HasherError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication response with user data and tokens
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    engine: RotationEngine,
    jwt_service: JwtService,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: UserRepository,
        engine: RotationEngine,
        jwt_service: JwtService,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            engine,
            jwt_service,
            hasher,
        }
    }

    /// Validate first name
    fn validate_name(name: &str) -> Result<(), AuthError> {
        if name.len() < NAME_MIN || name.len() > NAME_MAX {
            return Err(AuthError::InvalidName);
        }

        Ok(())
    }

    /// Validate last name
    fn validate_last_name(last_name: &str) -> Result<(), AuthError> {
        if last_name.len() < LAST_NAME_MIN || last_name.len() > LAST_NAME_MAX {
            return Err(AuthError::InvalidName);
        }

        Ok(())
    }

    /// Validate email format
    fn validate_email(email: &str) -> Result<(), AuthError> {
        if email.len() < EMAIL_MIN || email.len() > EMAIL_MAX {
            return Err(AuthError::InvalidEmail);
        }

        // Check for valid structure: something@something.something
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidEmail);
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() || domain.is_empty() {
            return Err(AuthError::InvalidEmail);
        }

        if !domain.contains('.') {
            return Err(AuthError::InvalidEmail);
        }

        // Check domain has something after the dot
        let domain_parts: Vec<&str> = domain.split('.').collect();
        if domain_parts.iter().any(|p| p.is_empty()) {
            return Err(AuthError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate password length
    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.len() < PASSWORD_MIN {
            return Err(AuthError::PasswordTooShort);
        }

        if password.len() > PASSWORD_MAX {
            return Err(AuthError::PasswordTooLong);
        }

        Ok(())
    }

    /// Register a new user.
    ///
    /// Registration creates the account only; tokens are issued by `login`.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        // Validate input
        Self::validate_name(&request.name)?;
        Self::validate_last_name(&request.last_name)?;
        Self::validate_email(&request.email)?;
        Self::validate_password(&request.password)?;

        let password_hash = self.hasher.hash(&request.password)?;

        let user = self
            .users
            .create(CreateUser {
                email: request.email,
                name: request.name,
                last_name: request.last_name,
                password_hash,
            })
            .await?;

        tracing::info!("User registered: {}", user.email);
        Ok(user.into())
    }

    /// Login an existing user and start a credential chain.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = self.hasher.verify(&request.password, &user.password_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.engine.issue_pair(&user).await?;

        tracing::info!("User logged in: {}", user.id);
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    /// Exchange a presented token for a fresh pair
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        Ok(self.engine.rotate(presented).await?)
    }

    /// Logout: retire the renewal credential behind the presented token
    pub async fn logout(&self, presented: &str) -> Result<(), AuthError> {
        Ok(self.engine.revoke_presented(presented).await?)
    }

    /// Logout from all devices; returns how many credentials were revoked
    pub async fn logout_all(&self, access_token: &str) -> Result<u64, AuthError> {
        let user_id = self.validate_access_token(access_token)?;
        Ok(self.engine.revoke_all_sessions(user_id).await?)
    }

    /// Get current user from access token.
    ///
    /// Resource access is a pure signature check; session state is only
    /// consulted at rotation time.
    pub async fn get_current_user(&self, access_token: &str) -> Result<UserResponse, AuthError> {
        let claims = self.jwt_service.validate_token(access_token)?;

        let user_id = claims.user_id()?;
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::InvalidToken)?;

        Ok(user.into())
    }

    /// Validate an access token and return the user ID if valid
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.jwt_service.validate_token(token)?;
        Ok(claims.user_id()?)
    }

    /// Change user password
    pub async fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user_id = self.validate_access_token(access_token)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::InvalidToken)?;

        // Verify current password
        let is_valid = self.hasher.verify(current_password, &user.password_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        Self::validate_password(new_password)?;

        let password_hash = self.hasher.hash(new_password)?;
        self.users.update_password(user_id, password_hash).await?;

        // Force re-login everywhere
        self.engine.revoke_all_sessions(user_id).await?;

        tracing::info!("Password changed for user: {}", user_id);
        Ok(())
    }
}
