//! Renewal credential registry
//!
//! Stores one record per issued renewal credential. Records are never
//! deleted: revocation is a one-way flag and expiry is judged against
//! `expires_at`, so the registry keeps the full history of a credential
//! chain.

use uuid::Uuid;

use crate::core::store::memory::{Store, UpdateOutcome};
use crate::core::store::models::RefreshToken;

/// Refresh token repository error types
#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenRepositoryError {
    #[error("Refresh token not found")]
    NotFound,
}

/// Outcome of an idempotent revoke call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// This call flipped the record from active to revoked
    Revoked,
    /// The record was already revoked; nothing changed
    AlreadyRevoked,
}

/// Refresh token repository for store operations
#[derive(Clone)]
pub struct RefreshTokenRepository {
    store: Store,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persist a record
    pub async fn save(&self, token: &RefreshToken) {
        self.store.refresh_tokens.insert(token.id, token.clone());
    }

    /// Find a record by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<RefreshToken> {
        self.store.refresh_tokens.get(id)
    }

    /// All records belonging to `user_id`, revoked ones included
    pub async fn find_all_for_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        self.store
            .refresh_tokens
            .find(|token| token.user_id == user_id)
    }

    /// Flip a record to revoked if it is still active.
    ///
    /// The check and the flip are one atomic step, so exactly one caller per
    /// record ever observes `Revoked`. Revoking an already-revoked record is
    /// a no-op reported as `AlreadyRevoked`.
    pub async fn revoke(&self, id: Uuid) -> Result<RevokeOutcome, RefreshTokenRepositoryError> {
        let outcome = self.store.refresh_tokens.conditional_update(
            id,
            |token| !token.revoked,
            |token| token.revoked = true,
        );

        match outcome {
            UpdateOutcome::Updated => Ok(RevokeOutcome::Revoked),
            UpdateOutcome::PredicateFailed => Ok(RevokeOutcome::AlreadyRevoked),
            UpdateOutcome::NotFound => Err(RefreshTokenRepositoryError::NotFound),
        }
    }

    /// Revoke every active record belonging to `user_id`; returns how many
    /// records this call flipped
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> u64 {
        self.store.refresh_tokens.update_many(
            |token| token.user_id == user_id && !token.revoked,
            |token| token.revoked = true,
        )
    }
}
