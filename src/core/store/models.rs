//! Record types held in the session state store
//!
//! Defines the user and renewal-credential entities plus the sanitized user
//! shape returned through the API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Monotonic counter; advancing it strands every credential minted under
    /// an older value. Never decreases.
    pub session_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data for creation (without id and timestamps)
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Refresh Token Model
// ============================================================================

/// Server-side record backing one renewal credential.
///
/// The record id doubles as the `jti` claim of the access token minted with
/// it. `revoked` only ever flips false to true, and `session_version` is the
/// owner's counter frozen at issuance; neither is ever reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub session_version: i64,
}

impl RefreshToken {
    /// Fresh active record snapshotting the owner's current session version
    pub fn new(user_id: Uuid, session_version: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            issued_at: now,
            expires_at: now + ttl,
            revoked: false,
            session_version,
        }
    }

    /// Whether the record's lifetime has elapsed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// Tests
// ============================================================================
