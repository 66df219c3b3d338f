//! # inkpress-server
//!
//! The Inkpress application server: configuration loading, tracing
//! bootstrap, an in-memory credential store, and the HTTP surface of the
//! authentication token service.

use std::sync::Arc;

use axum::Router;
use inkpress_auth::middleware::AuthState;
use inkpress_auth::storage::{NewUser, Role, UserStorage};
use inkpress_auth::{AuthService, TokenCodec, password};

pub mod config;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use state::AppState;
pub use storage::MemoryUserStorage;

/// Builds the application router from configuration.
///
/// Wires the codec, the in-memory store, the auth service, and the guard
/// state, then seeds the bootstrap admin if one is configured.
///
/// # Errors
///
/// Fails if seeding the bootstrap admin fails.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let storage = MemoryUserStorage::shared();
    seed_admin(config, storage.clone()).await?;

    let codec = Arc::new(TokenCodec::new(&config.auth.secret, &config.auth.issuer));
    let users: Arc<dyn UserStorage> = storage;
    let service = Arc::new(AuthService::new(&config.auth, codec.clone(), users.clone()));
    let auth = AuthState::new(&config.auth, codec, users);

    let state = AppState {
        auth,
        service,
        cookies: config.auth.cookies.clone(),
    };

    Ok(routes::router(state))
}

/// Upserts the configured admin account.
///
/// Keyed by username, so restarts converge on the configured credentials
/// instead of accumulating accounts.
async fn seed_admin(config: &AppConfig, storage: Arc<MemoryUserStorage>) -> anyhow::Result<()> {
    let Some(ref admin) = config.bootstrap.admin else {
        return Ok(());
    };

    let password_hash = password::hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("failed to hash bootstrap admin password: {e}"))?;

    let user = storage
        .upsert(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await
        .map_err(|e| anyhow::anyhow!("failed to seed bootstrap admin: {e}"))?;

    tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap admin seeded");
    Ok(())
}
