//! Record repositories over the session state store
//!
//! Repositories encapsulate data access and give the business logic a
//! narrow, typed API over the raw collections.

pub mod token;
pub mod user;

pub use token::{RefreshTokenRepository, RefreshTokenRepositoryError, RevokeOutcome};
pub use user::{UserRepository, UserRepositoryError};
