//! Renewal credential rotation engine
//!
//! Renewal credentials are single-use: rotating one atomically retires it
//! and mints a successor, so every login owns exactly one live chain.
//! Presenting a retired credential from the current session generation is
//! treated as theft: every credential the user holds is revoked and the
//! user's session version advances, stranding anything minted before the
//! sweep.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::store::models::{RefreshToken, User};
use crate::core::store::repositories::{RefreshTokenRepository, RevokeOutcome, UserRepository};

/// Default renewal credential lifetime (7 days)
const RENEWAL_TTL_DAYS: i64 = 7;

/// Rotation engine error types
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token reuse detected")]
    TokenReuseDetected,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for RotationError {
    fn from(err: JwtError) -> Self {
        match err {
            // An expired presented token fails verification outright;
            // TokenExpired is reserved for the stored record's lifetime.
            JwtError::Expired | JwtError::InvalidToken => RotationError::InvalidToken,
            other => RotationError::Internal(other.to_string()),
        }
    }
}

/// Issued credential pair (one signed token, two lifetimes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token; its `jti` doubles as the renewal handle
    pub access_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Renewal credential expiration (Unix timestamp)
    pub renewal_expires_at: i64,
    /// Token type (always "Bearer")
    pub token_type: String,
}

/// Drives the issue/rotate/revoke lifecycle of renewal credentials
#[derive(Clone)]
pub struct RotationEngine {
    users: UserRepository,
    tokens: RefreshTokenRepository,
    jwt_service: JwtService,
    renewal_ttl: Duration,
}

impl RotationEngine {
    /// Create a new rotation engine with the default renewal lifetime
    pub fn new(
        users: UserRepository,
        tokens: RefreshTokenRepository,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            users,
            tokens,
            jwt_service,
            renewal_ttl: Duration::days(RENEWAL_TTL_DAYS),
        }
    }

    /// Set the renewal credential lifetime
    pub fn renewal_ttl(mut self, ttl: Duration) -> Self {
        self.renewal_ttl = ttl;
        self
    }

    /// Mint a fresh record and the access token bound to it.
    ///
    /// The record id is generated first and signed into the token's `jti`,
    /// and the record is persisted only once signing succeeded, so a signer
    /// failure leaves no orphaned record behind.
    async fn mint_pair(
        &self,
        user_id: Uuid,
        session_version: i64,
    ) -> Result<TokenPair, RotationError> {
        let record = RefreshToken::new(user_id, session_version, self.renewal_ttl);

        let (access_token, access_expires_at) = self
            .jwt_service
            .generate_access_token(user_id, record.id)?;

        let renewal_expires_at = record.expires_at.timestamp();
        self.tokens.save(&record).await;

        Ok(TokenPair {
            access_token,
            access_expires_at,
            renewal_expires_at,
            token_type: "Bearer".to_string(),
        })
    }

    /// Start a new credential chain for `user` (login)
    pub async fn issue_pair(&self, user: &User) -> Result<TokenPair, RotationError> {
        let pair = self.mint_pair(user.id, user.session_version).await?;

        tracing::info!("Issued credential pair for user: {}", user.id);
        Ok(pair)
    }

    /// Exchange a presented token for a fresh pair, retiring its record.
    ///
    /// Exactly one caller can rotate a given record. A presented token whose
    /// record was already spent in the current session generation trips the
    /// reuse cascade; anything older than the user's session version is
    /// rejected without touching state.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, RotationError> {
        let claims = self.jwt_service.validate_token(presented)?;
        let user_id = claims.user_id()?;
        let token_id = claims.token_id()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .ok_or(RotationError::InvalidToken)?;
        let record = self
            .tokens
            .find_by_id(token_id)
            .await
            .ok_or(RotationError::InvalidToken)?;

        // A credential minted before a cascade or global logout is inert,
        // whether or not the sweep also flipped its revoked flag.
        if record.session_version < user.session_version {
            return Err(RotationError::InvalidToken);
        }

        // Spent within the current generation: single-use is violated.
        if record.revoked {
            return Err(self.handle_reuse(&user, record.id).await);
        }

        if record.is_expired_at(Utc::now()) {
            return Err(RotationError::TokenExpired);
        }

        // Claim the record. Losing the flip means a concurrent caller spent
        // it between our load and now, which is the reuse case again.
        match self.tokens.revoke(record.id).await {
            Ok(RevokeOutcome::Revoked) => {}
            Ok(RevokeOutcome::AlreadyRevoked) => {
                return Err(self.handle_reuse(&user, record.id).await);
            }
            Err(_) => return Err(RotationError::InvalidToken),
        }

        let pair = self.mint_pair(user.id, user.session_version).await?;

        tracing::info!(
            "Rotated renewal credential {} for user: {}",
            record.id,
            user.id
        );
        Ok(pair)
    }

    /// Revoke the record bound to a presented token (logout).
    ///
    /// Idempotent: revoking an already-revoked record succeeds quietly.
    pub async fn revoke_presented(&self, presented: &str) -> Result<(), RotationError> {
        let claims = self.jwt_service.validate_token(presented)?;
        let token_id = claims.token_id()?;

        match self.tokens.revoke(token_id).await {
            Ok(RevokeOutcome::Revoked) => {
                tracing::info!("Renewal credential {} revoked", token_id);
                Ok(())
            }
            Ok(RevokeOutcome::AlreadyRevoked) => Ok(()),
            Err(_) => Err(RotationError::InvalidToken),
        }
    }

    /// Revoke every credential of `user_id` and advance the session version
    /// (global logout); returns how many records were swept
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> Result<u64, RotationError> {
        let revoked = self.tokens.revoke_all_for_user(user_id).await;
        self.users
            .bump_session_version(user_id)
            .await
            .map_err(|_| RotationError::InvalidToken)?;

        tracing::info!(
            "Revoked {} credential(s) for user {} (global logout)",
            revoked,
            user_id
        );
        Ok(revoked)
    }

    /// Reuse cascade: sweep the user's credentials, advance the session
    /// version, and report theft to the caller.
    ///
    /// The caller receives `TokenReuseDetected` even when a sweep write
    /// fails; the failure itself goes to the error log.
    async fn handle_reuse(&self, user: &User, token_id: Uuid) -> RotationError {
        let revoked = self.tokens.revoke_all_for_user(user.id).await;

        tracing::warn!(
            "Reuse of renewal credential {} by user {}: revoked {} active credential(s)",
            token_id,
            user.id,
            revoked
        );

        if let Err(e) = self.users.bump_session_version(user.id).await {
            tracing::error!("Session version bump failed for user {}: {}", user.id, e);
        }

        RotationError::TokenReuseDetected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::JwtConfig;
    use crate::core::store::memory::Store;
    use crate::core::store::models::CreateUser;

    const TEST_SECRET: &str = "rotation_test_secret_32_bytes_long!!";

    fn engine_with(config: JwtConfig) -> RotationEngine {
        let store = Store::new();
        RotationEngine::new(
            UserRepository::new(store.clone()),
            RefreshTokenRepository::new(store),
            JwtService::new(config),
        )
    }

    fn test_engine() -> RotationEngine {
        engine_with(JwtConfig::new(TEST_SECRET))
    }

    async fn test_user(engine: &RotationEngine) -> User {
        engine
            .users
            .create(CreateUser {
                email: format!("{}@example.com", Uuid::new_v4()),
                name: "Rotor".to_string(),
                last_name: "Tester".to_string(),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn bound_record_id(engine: &RotationEngine, pair: &TokenPair) -> Uuid {
        engine
            .jwt_service
            .validate_token(&pair.access_token)
            .unwrap()
            .token_id()
            .unwrap()
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    #[tokio::test]
    async fn test_issue_pair_creates_active_record() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert!(pair.access_expires_at > Utc::now().timestamp());
        assert!(pair.renewal_expires_at > Utc::now().timestamp());

        let record = engine
            .tokens
            .find_by_id(bound_record_id(&engine, &pair))
            .await
            .unwrap();
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.session_version, 0);
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn test_access_token_is_bound_to_stored_record() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();
        let claims = engine.jwt_service.validate_token(&pair.access_token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert!(engine
            .tokens
            .find_by_id(claims.token_id().unwrap())
            .await
            .is_some());
    }

    // ========================================================================
    // Rotation
    // ========================================================================

    #[tokio::test]
    async fn test_rotate_retires_old_and_mints_successor() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let first = engine.issue_pair(&user).await.unwrap();
        let first_id = bound_record_id(&engine, &first);

        let second = engine.rotate(&first.access_token).await.unwrap();
        let second_id = bound_record_id(&engine, &second);

        assert_ne!(first_id, second_id);
        assert!(engine.tokens.find_by_id(first_id).await.unwrap().revoked);

        let successor = engine.tokens.find_by_id(second_id).await.unwrap();
        assert!(!successor.revoked);
        assert_eq!(successor.user_id, user.id);
        assert_eq!(successor.session_version, 0);
    }

    #[tokio::test]
    async fn test_rotation_chain_keeps_one_live_credential() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let mut pair = engine.issue_pair(&user).await.unwrap();
        for _ in 0..5 {
            pair = engine.rotate(&pair.access_token).await.unwrap();
        }

        let all = engine.tokens.find_all_for_user(user.id).await;
        assert_eq!(all.len(), 6);
        assert_eq!(all.iter().filter(|t| !t.revoked).count(), 1);
    }

    // ========================================================================
    // Rejection
    // ========================================================================

    #[tokio::test]
    async fn test_rotate_rejects_garbage() {
        let engine = test_engine();

        let result = engine.rotate("not.a.token").await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_rotate_rejects_foreign_signature() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let foreign = JwtService::new(JwtConfig::new("some_other_secret_entirely_here!"));
        let (token, _) = foreign
            .generate_access_token(user.id, Uuid::new_v4())
            .unwrap();

        let result = engine.rotate(&token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_rotate_rejects_expired_presented_token() {
        // The token itself expires immediately; its record is still live
        let engine = engine_with(JwtConfig::new(TEST_SECRET).access_token_expiration(-5));
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();

        let result = engine.rotate(&pair.access_token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_rotate_rejects_unknown_record() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let (token, _) = engine
            .jwt_service
            .generate_access_token(user.id, Uuid::new_v4())
            .unwrap();

        let result = engine.rotate(&token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_rotate_rejects_unknown_user() {
        let engine = test_engine();

        let (token, _) = engine
            .jwt_service
            .generate_access_token(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();

        let result = engine.rotate(&token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    // ========================================================================
    // Reuse Detection
    // ========================================================================

    #[tokio::test]
    async fn test_replay_triggers_cascade() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let first = engine.issue_pair(&user).await.unwrap();
        let second = engine.rotate(&first.access_token).await.unwrap();

        // Replaying the spent credential revokes everything, the live
        // successor included
        let result = engine.rotate(&first.access_token).await;
        assert!(matches!(result, Err(RotationError::TokenReuseDetected)));

        let all = engine.tokens.find_all_for_user(user.id).await;
        assert!(all.iter().all(|t| t.revoked));
        assert!(engine
            .tokens
            .find_by_id(bound_record_id(&engine, &second))
            .await
            .unwrap()
            .revoked);

        let user = engine.users.find_by_id(user.id).await.unwrap();
        assert_eq!(user.session_version, 1);
    }

    #[tokio::test]
    async fn test_cascaded_successor_is_stale_not_reuse() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let first = engine.issue_pair(&user).await.unwrap();
        let second = engine.rotate(&first.access_token).await.unwrap();
        let _ = engine.rotate(&first.access_token).await;

        // The successor was minted under version 0 and the cascade moved the
        // user to 1, so it is stale rather than a fresh theft signal
        let result = engine.rotate(&second.access_token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));

        // No second cascade fired
        let user = engine.users.find_by_id(user.id).await.unwrap();
        assert_eq!(user.session_version, 1);
        assert_eq!(engine.tokens.find_all_for_user(user.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_credential_rejected_without_state_change() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();
        engine.users.bump_session_version(user.id).await.unwrap();

        let result = engine.rotate(&pair.access_token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));

        // The record was left exactly as it was
        let record = engine
            .tokens
            .find_by_id(bound_record_id(&engine, &pair))
            .await
            .unwrap();
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn test_replay_after_logout_is_reuse() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();
        engine.revoke_presented(&pair.access_token).await.unwrap();

        // Same-generation revoked record: rotating it is the reuse case
        let result = engine.rotate(&pair.access_token).await;
        assert!(matches!(result, Err(RotationError::TokenReuseDetected)));

        let user = engine.users.find_by_id(user.id).await.unwrap();
        assert_eq!(user.session_version, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotation_has_single_winner() {
        let engine = test_engine();
        let user = test_user(&engine).await;
        let pair = engine.issue_pair(&user).await.unwrap();

        let task = |engine: RotationEngine, token: String| {
            tokio::spawn(async move { engine.rotate(&token).await })
        };

        let a = task(engine.clone(), pair.access_token.clone());
        let b = task(engine.clone(), pair.access_token.clone());
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(
                        e,
                        RotationError::TokenReuseDetected | RotationError::InvalidToken
                    ),
                    "unexpected loser error: {:?}",
                    e
                );
            }
        }
    }

    // ========================================================================
    // Record Expiry
    // ========================================================================

    #[tokio::test]
    async fn test_expired_record_is_not_theft() {
        let engine = test_engine().renewal_ttl(Duration::days(-1));
        let user = test_user(&engine).await;

        let pair = engine.issue_pair(&user).await.unwrap();

        let result = engine.rotate(&pair.access_token).await;
        assert!(matches!(result, Err(RotationError::TokenExpired)));

        // Expiry is not reuse: the record keeps its flag and no cascade runs
        let record = engine
            .tokens
            .find_by_id(bound_record_id(&engine, &pair))
            .await
            .unwrap();
        assert!(!record.revoked);

        let user = engine.users.find_by_id(user.id).await.unwrap();
        assert_eq!(user.session_version, 0);
    }

    // ========================================================================
    // Revocation
    // ========================================================================

    #[tokio::test]
    async fn test_revoke_presented_is_idempotent() {
        let engine = test_engine();
        let user = test_user(&engine).await;
        let pair = engine.issue_pair(&user).await.unwrap();

        engine.revoke_presented(&pair.access_token).await.unwrap();
        engine.revoke_presented(&pair.access_token).await.unwrap();

        let record = engine
            .tokens
            .find_by_id(bound_record_id(&engine, &pair))
            .await
            .unwrap();
        assert!(record.revoked);
    }

    #[tokio::test]
    async fn test_revoke_presented_rejects_garbage() {
        let engine = test_engine();

        let result = engine.revoke_presented("junk").await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_revoke_presented_rejects_unknown_record() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let (token, _) = engine
            .jwt_service
            .generate_access_token(user.id, Uuid::new_v4())
            .unwrap();

        let result = engine.revoke_presented(&token).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_revoke_all_sessions_sweeps_and_bumps() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        let pairs = [
            engine.issue_pair(&user).await.unwrap(),
            engine.issue_pair(&user).await.unwrap(),
            engine.issue_pair(&user).await.unwrap(),
        ];

        let swept = engine.revoke_all_sessions(user.id).await.unwrap();
        assert_eq!(swept, 3);

        let user_after = engine.users.find_by_id(user.id).await.unwrap();
        assert_eq!(user_after.session_version, 1);

        for pair in &pairs {
            let result = engine.rotate(&pair.access_token).await;
            assert!(matches!(result, Err(RotationError::InvalidToken)));
        }
    }

    #[tokio::test]
    async fn test_revoke_all_sessions_unknown_user() {
        let engine = test_engine();

        let result = engine.revoke_all_sessions(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RotationError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_relogin_after_global_logout() {
        let engine = test_engine();
        let user = test_user(&engine).await;

        engine.issue_pair(&user).await.unwrap();
        engine.revoke_all_sessions(user.id).await.unwrap();

        // A fresh login under the bumped version starts a usable chain
        let user = engine.users.find_by_id(user.id).await.unwrap();
        let pair = engine.issue_pair(&user).await.unwrap();
        assert!(engine.rotate(&pair.access_token).await.is_ok());
    }
}
