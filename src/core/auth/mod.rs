//! Authentication module for Keymint
//!
//! This module provides authentication functionality including:
//! - JWT access token generation and validation
//! - User registration and login
//! - Single-use renewal credential rotation with reuse detection
//! - REST API endpoints for auth operations

pub mod api;
pub mod jwt;
pub mod password;
pub mod rotation;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use password::{BcryptHasher, HasherError, PasswordHasher};
pub use rotation::{RotationEngine, RotationError, TokenPair};
pub use service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
