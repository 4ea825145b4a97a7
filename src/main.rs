use std::sync::Arc;

use chrono::Duration;
use keymint::core::auth::{
    AuthApiState, AuthService, BcryptHasher, JwtService, RotationEngine, auth_api_router,
};
use keymint::core::config::Config;
use keymint::core::store::{RefreshTokenRepository, Store, UserRepository};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load application config from environment variables
    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: bind_addr={}, renewal_ttl_days={}",
        config.bind_addr,
        config.renewal_ttl_days
    );

    let jwt_service = JwtService::from_env().expect("JWT configuration is incomplete");

    let store = Store::new();
    let users = UserRepository::new(store.clone());
    let tokens = RefreshTokenRepository::new(store);

    let engine = RotationEngine::new(users.clone(), tokens, jwt_service.clone())
        .renewal_ttl(Duration::days(config.renewal_ttl_days));

    let auth_service = AuthService::new(users, engine, jwt_service, Arc::new(BcryptHasher::new()));

    // Build the auth API router with request tracing
    let app = auth_api_router(AuthApiState { auth_service }).layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", &config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
