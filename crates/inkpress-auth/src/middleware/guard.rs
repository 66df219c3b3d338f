//! Verification guard: request → authenticated identity, or a typed
//! rejection.
//!
//! This module provides the Axum extractors API routes use. Every variant
//! runs the same per-request state machine; they differ only in what a
//! rejection becomes (a structured 401/403 here, a redirect in
//! [`crate::middleware::pages`]).
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use inkpress_auth::middleware::{AuthState, AuthUser};
//!
//! async fn me_handler(AuthUser(identity): AuthUser) -> String {
//!     format!("Hello, {}!", identity.username)
//! }
//!
//! let app = Router::new()
//!     .route("/users/me", get(me_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::config::{AuthConfig, CookieConfig};
use crate::error::{AuthError, AuthResult};
use crate::storage::{Role, UserProjection, UserStorage};
use crate::token::{TokenCodec, TokenKind};
use crate::transport;

// =============================================================================
// Auth State
// =============================================================================

/// State required by the guard extractors.
///
/// Include this in your application state and expose it via `FromRef`:
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
///     // ... other state
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Codec for token verification.
    pub codec: Arc<TokenCodec>,

    /// Credential store for resolving token subjects.
    pub users: Arc<dyn UserStorage>,

    /// Cookie configuration for browser-based transport.
    pub cookies: CookieConfig,

    /// Where page guards send rejected visitors.
    pub login_path: String,
}

impl AuthState {
    /// Creates guard state from configuration and a store.
    #[must_use]
    pub fn new(config: &AuthConfig, codec: Arc<TokenCodec>, users: Arc<dyn UserStorage>) -> Self {
        Self {
            codec,
            users,
            cookies: config.cookies.clone(),
            login_path: config.login_path.clone(),
        }
    }
}

// =============================================================================
// Shared State Machine
// =============================================================================

/// Resolves a request to an authenticated identity.
///
/// Terminal states are `Ok(identity)` and `Err(reason)`:
///
/// 1. read access token (header precedence); absent rejects with `NoToken`
/// 2. decode; `Expired` / `InvalidSignature` / `Malformed` pass through
/// 3. kind must be `Access`, else `WrongKind`
/// 4. resolve the subject in the store; absent rejects with
///    `UnknownSubject`. The returned identity is built from the *stored*
///    user, so a stale or forged role claim in the token never survives
///    this step.
/// 5. compare against `required_role` if the route demands one; a mismatch
///    rejects with `Forbidden`
///
/// # Errors
///
/// Any rejection from the taxonomy above, or `Storage` if the lookup fails.
pub(crate) async fn authenticate(
    parts: &Parts,
    state: &AuthState,
    required_role: Option<Role>,
) -> AuthResult<UserProjection> {
    // 1. Extract the access token.
    let token = transport::read_access_token(&parts.headers, &state.cookies)
        .ok_or(AuthError::NoToken)?;

    // 2. Decode and verify.
    let claims = state.codec.decode(&token).inspect_err(|e| {
        tracing::debug!(error = %e, "Access token failed verification");
    })?;

    // 3. Only access tokens authorize requests.
    claims.require_kind(TokenKind::Access)?;

    // 4. Resolve the subject; identity comes from the store, not the token.
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "Token subject not found in store");
            AuthError::unknown_subject(&claims.sub)
        })?;

    // 5. Role gate, against the stored role.
    if let Some(required) = required_role
        && user.role != required
    {
        tracing::debug!(
            user_id = %user.id,
            role = %user.role,
            required = %required,
            "Role requirement not met"
        );
        return Err(AuthError::forbidden(format!("{required} role required")));
    }

    // 6. Authenticated.
    Ok(user.projection())
}

// =============================================================================
// Responding Extractors
// =============================================================================

/// Extractor for routes any authenticated user may call.
///
/// Rejections become structured 401/403 responses, never redirects.
pub struct AuthUser(pub UserProjection);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let identity = authenticate(parts, &auth_state, None).await?;

        tracing::debug!(user_id = %identity.id, "Request authenticated");
        Ok(Self(identity))
    }
}

/// Extractor for admin-only routes.
///
/// Runs the same state machine as [`AuthUser`] with a required role of
/// [`Role::Admin`]; a valid non-admin token is rejected with 403.
pub struct AdminUser(pub UserProjection);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let identity = authenticate(parts, &auth_state, Some(Role::Admin)).await?;

        tracing::debug!(user_id = %identity.id, "Admin request authenticated");
        Ok(Self(identity))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewUser, User};
    use crate::token::TokenIssuer;
    use async_trait::async_trait;
    use axum::http::{HeaderValue, Request, header::AUTHORIZATION, header::COOKIE};
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct FakeUserStorage {
        users: RwLock<HashMap<String, User>>,
    }

    impl FakeUserStorage {
        fn with_users(users: Vec<User>) -> Arc<Self> {
            let map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
            Arc::new(Self {
                users: RwLock::new(map),
            })
        }
    }

    #[async_trait]
    impl UserStorage for FakeUserStorage {
        async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>> {
            Ok(self.users.read().await.get(id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email.as_deref() == Some(email))
                .cloned())
        }

        async fn create(&self, new_user: NewUser) -> AuthResult<User> {
            let user = User::new(new_user.username, new_user.email, new_user.password_hash)
                .with_role(new_user.role);
            self.users
                .write()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn upsert(&self, new_user: NewUser) -> AuthResult<User> {
            self.create(new_user).await
        }
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        }
    }

    fn test_user(role: Role) -> User {
        User::new("alice", Some("a@b.com".to_string()), "$argon2id$stub").with_role(role)
    }

    struct Fixture {
        state: AuthState,
        issuer: TokenIssuer,
        user: User,
    }

    fn fixture(role: Role) -> Fixture {
        let config = test_config();
        let codec = Arc::new(TokenCodec::new(&config.secret, &config.issuer));
        let user = test_user(role);
        let users = FakeUserStorage::with_users(vec![user.clone()]);
        let issuer = TokenIssuer::new(codec.clone(), &config);
        let state = AuthState::new(&config, codec, users);
        Fixture {
            state,
            issuer,
            user,
        }
    }

    fn parts_with_bearer(token: &str) -> Parts {
        let request = Request::builder()
            .header(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
            )
            .body(())
            .unwrap();
        request.into_parts().0
    }

    fn parts_with_cookie(cookie: &str) -> Parts {
        let request = Request::builder()
            .header(COOKIE, HeaderValue::from_str(cookie).unwrap())
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_no_token_rejected() {
        let fx = fixture(Role::User);
        let parts = Request::builder().body(()).unwrap().into_parts().0;

        let result = authenticate(&parts, &fx.state, None).await;
        assert!(matches!(result, Err(AuthError::NoToken)));
    }

    #[tokio::test]
    async fn test_valid_access_token_authenticates() {
        let fx = fixture(Role::User);
        let pair = fx.issuer.issue_pair(&fx.user.projection()).unwrap();
        let parts = parts_with_bearer(&pair.access_token);

        let identity = authenticate(&parts, &fx.state, None).await.unwrap();
        assert_eq!(identity.id, fx.user.id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn test_access_token_accepted_from_cookie() {
        let fx = fixture(Role::User);
        let pair = fx.issuer.issue_pair(&fx.user.projection()).unwrap();
        let parts = parts_with_cookie(&format!("access_token={}", pair.access_token));

        let identity = authenticate(&parts, &fx.state, None).await.unwrap();
        assert_eq!(identity.id, fx.user.id);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_where_access_required() {
        let fx = fixture(Role::User);
        let pair = fx.issuer.issue_pair(&fx.user.projection()).unwrap();
        let parts = parts_with_bearer(&pair.refresh_token);

        let result = authenticate(&parts, &fx.state, None).await;
        assert!(matches!(result, Err(AuthError::WrongKind { .. })));
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let fx = fixture(Role::User);
        let ghost = UserProjection {
            id: "deleted-user".to_string(),
            username: "ghost".to_string(),
            role: Role::User,
        };
        let pair = fx.issuer.issue_pair(&ghost).unwrap();
        let parts = parts_with_bearer(&pair.access_token);

        let result = authenticate(&parts, &fx.state, None).await;
        assert!(matches!(result, Err(AuthError::UnknownSubject { .. })));
    }

    #[tokio::test]
    async fn test_non_admin_forbidden_on_admin_route() {
        let fx = fixture(Role::User);
        let pair = fx.issuer.issue_pair(&fx.user.projection()).unwrap();
        let parts = parts_with_bearer(&pair.access_token);

        let result = authenticate(&parts, &fx.state, Some(Role::Admin)).await;
        assert!(matches!(result, Err(AuthError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_admin_passes_admin_gate() {
        let fx = fixture(Role::Admin);
        let pair = fx.issuer.issue_pair(&fx.user.projection()).unwrap();
        let parts = parts_with_bearer(&pair.access_token);

        let identity = authenticate(&parts, &fx.state, Some(Role::Admin))
            .await
            .unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_role_is_reresolved_from_store() {
        // Token minted while the user was an admin; the store has since
        // demoted them. The stale claim must not survive verification.
        let config = test_config();
        let codec = Arc::new(TokenCodec::new(&config.secret, &config.issuer));
        let issuer = TokenIssuer::new(codec.clone(), &config);

        let demoted = test_user(Role::User);
        let stale_projection = UserProjection {
            id: demoted.id.clone(),
            username: demoted.username.clone(),
            role: Role::Admin,
        };
        let users = FakeUserStorage::with_users(vec![demoted]);
        let state = AuthState::new(&config, codec, users);

        let pair = issuer.issue_pair(&stale_projection).unwrap();
        let parts = parts_with_bearer(&pair.access_token);

        let result = authenticate(&parts, &state, Some(Role::Admin)).await;
        assert!(matches!(result, Err(AuthError::Forbidden { .. })));

        // Without a role requirement the request authenticates, but with
        // the store's role, not the token's.
        let identity = authenticate(&parts, &state, None).await.unwrap();
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let fx = fixture(Role::User);
        let parts = parts_with_bearer("garbage.token.here");

        let result = authenticate(&parts, &fx.state, None).await;
        assert!(matches!(result, Err(AuthError::Malformed { .. })));
    }
}
