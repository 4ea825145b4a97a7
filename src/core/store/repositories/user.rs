//! User repository over the session state store
//!
//! Owns account records: creation with unique-email enforcement, lookups,
//! password updates, and the session version counter.

use chrono::Utc;
use uuid::Uuid;

use crate::core::store::memory::{Store, UpdateOutcome};
use crate::core::store::models::{CreateUser, User};

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,
}

/// User repository for store operations
#[derive(Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a new user with the session version counter at zero
    pub async fn create(&self, dto: CreateUser) -> Result<User, UserRepositoryError> {
        // App-level uniqueness check; the store has no unique index, so
        // two concurrent registrations of the same address can race past it
        if self.find_by_email(&dto.email).await.is_some() {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: dto.email,
            name: dto.name,
            last_name: dto.last_name,
            password_hash: dto.password_hash,
            session_version: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.store.users.get(id)
    }

    /// Find a user by email (exact match)
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.store
            .users
            .find(|user| user.email == email)
            .into_iter()
            .next()
    }

    /// Advance the user's session version by one and return the new value.
    ///
    /// The counter only moves forward; every credential snapshotted under an
    /// older value becomes stale.
    pub async fn bump_session_version(&self, id: Uuid) -> Result<i64, UserRepositoryError> {
        let mut version = 0;
        let outcome = self.store.users.conditional_update(
            id,
            |_| true,
            |user| {
                user.session_version += 1;
                user.updated_at = Utc::now();
                version = user.session_version;
            },
        );

        match outcome {
            UpdateOutcome::Updated => Ok(version),
            _ => Err(UserRepositoryError::NotFound),
        }
    }

    /// Replace the user's password hash
    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: String,
    ) -> Result<(), UserRepositoryError> {
        let outcome = self.store.users.conditional_update(
            id,
            |_| true,
            |user| {
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
            },
        );

        match outcome {
            UpdateOutcome::Updated => Ok(()),
            _ => Err(UserRepositoryError::NotFound),
        }
    }
}
