//! Session state storage for keymint
//!
//! This module provides the record types, the in-memory keyed store that
//! holds them, and the repositories the auth layer talks to.

pub mod memory;
pub mod models;
pub mod repositories;

pub use memory::{Collection, Store, UpdateOutcome};
pub use models::{CreateUser, RefreshToken, User, UserResponse};
pub use repositories::{
    RefreshTokenRepository, RefreshTokenRepositoryError, RevokeOutcome, UserRepository,
    UserRepositoryError,
};
