//! Password hashing capability
//!
//! Wraps bcrypt behind a narrow trait so the auth service stays independent
//! of the digest scheme.

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

/// Password hashing error types
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

/// Opaque digest capability: hash a secret, verify a secret against a digest
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HasherError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HasherError>;
}

/// bcrypt-backed hasher with automatic salt generation
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Hasher at the production cost factor
    pub fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Hasher with a custom cost factor. Low costs are only appropriate for
    /// tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, HasherError> {
        bcrypt::hash(password, self.cost).map_err(|e| HasherError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HasherError> {
        bcrypt::verify(password, hash).map_err(|e| HasherError::HashingError(e.to_string()))
    }
}
