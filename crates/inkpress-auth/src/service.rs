//! Core authentication flows.
//!
//! [`AuthService`] orchestrates the codec, the issuer, and the credential
//! store into the four flows the HTTP layer exposes: signup, login,
//! refresh, and logout. It owns no transport concerns: cookies and headers
//! belong to [`crate::transport`] and the handlers.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::password;
use crate::session::Session;
use crate::storage::{NewUser, Role, UserProjection, UserStorage};
use crate::token::{TokenCodec, TokenIssuer, TokenKind};

// =============================================================================
// Request Types
// =============================================================================

/// Signup request body.
///
/// Fields are optional at the serde layer so that a missing field surfaces
/// as a 400 validation error rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address. Required, unique.
    pub email: Option<String>,

    /// Username. Required, unique, non-empty.
    pub username: Option<String>,

    /// Plaintext password; hashed before it reaches the store.
    pub password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username. Required.
    pub username: Option<String>,

    /// Plaintext password. Required.
    pub password: Option<String>,
}

// =============================================================================
// Auth Service
// =============================================================================

/// Orchestrates signup, login, refresh, and logout.
///
/// Stateless across requests: every flow is a pure pipeline over the token
/// in hand plus at most one identity lookup, so instances are freely shared
/// behind an `Arc` with no locking.
pub struct AuthService {
    users: Arc<dyn UserStorage>,
    codec: Arc<TokenCodec>,
    issuer: TokenIssuer,
    rotate_refresh_tokens: bool,
}

impl AuthService {
    /// Creates the service from configuration and a store.
    #[must_use]
    pub fn new(config: &AuthConfig, codec: Arc<TokenCodec>, users: Arc<dyn UserStorage>) -> Self {
        let issuer = TokenIssuer::new(codec.clone(), config);
        Self {
            users,
            codec,
            issuer,
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }

    /// Registers a new user and issues their first session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for missing/invalid fields or a password
    ///   below the minimum length
    /// - [`AuthError::Conflict`] when the username or email is taken
    /// - [`AuthError::PasswordHash`] / [`AuthError::Storage`] on server
    ///   failures
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<(Session, UserProjection)> {
        let email = require_field(request.email, "email")?;
        let username = require_field(request.username, "username")?;
        let password = require_field(request.password, "password")?;

        if !email.contains('@') {
            return Err(AuthError::validation("email is not a valid address"));
        }
        password::check_password_policy(&password)?;

        let password_hash = password::hash_password(&password)?;
        let user = self
            .users
            .create(NewUser {
                username,
                email: Some(email),
                password_hash,
                role: Role::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

        let projection = user.projection();
        let pair = self.issuer.issue_pair(&projection)?;
        Ok((Session::from_pair(&pair), projection))
    }

    /// Authenticates a username/password pair and issues a session.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] whether the username is unknown or
    /// the password wrong; the two are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(Session, UserProjection)> {
        let username = require_field(request.username, "username")?;
        let password = require_field(request.password, "password")?;

        let user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&password, &user.password_hash)? {
            tracing::debug!(username = %username, "Password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        let projection = user.projection();
        let pair = self.issuer.issue_pair(&projection)?;
        Ok((Session::from_pair(&pair), projection))
    }

    /// Exchanges a valid refresh token for a new session.
    ///
    /// With rotation enabled (the default) the refresh token is reissued
    /// alongside the access token; otherwise the incoming token is carried
    /// forward until its natural expiry.
    ///
    /// # Errors
    ///
    /// Every client-caused failure (expired, malformed, unsigned, wrong
    /// kind, unknown subject, plus the absent-token case handled by callers)
    /// collapses into [`AuthError::RefreshDenied`] so the response does not
    /// reveal which check failed. Storage failures pass through as 500s.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<(Session, UserProjection)> {
        let user = self.verify_refresh_token(refresh_token).await?;
        let projection = user.projection();

        let session = if self.rotate_refresh_tokens {
            let pair = self.issuer.issue_pair(&projection)?;
            Session::from_pair(&pair)
        } else {
            let (access_token, expires_at) = self.issuer.issue_access(&projection)?;
            Session::renewed(access_token, refresh_token.to_string(), expires_at)
        };

        tracing::debug!(
            user_id = %projection.id,
            rotated = self.rotate_refresh_tokens,
            "Access token refreshed"
        );

        Ok((session, projection))
    }

    /// Verifies a refresh token ahead of logout.
    ///
    /// Logout is the degenerate refresh flow: the token must verify exactly
    /// as for [`Self::refresh`], but nothing is reissued: the caller clears
    /// the transport instead. Verifying first means logout cannot be used to
    /// blindly probe or clear someone else's cookies.
    ///
    /// # Errors
    ///
    /// Same collapse as [`Self::refresh`].
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<UserProjection> {
        let user = self.verify_refresh_token(refresh_token).await?;

        tracing::info!(user_id = %user.id, "User logged out");
        Ok(user.projection())
    }

    /// Shared verification for the refresh/logout flows.
    async fn verify_refresh_token(&self, token: &str) -> AuthResult<crate::storage::User> {
        let claims = self
            .codec
            .decode(token)
            .and_then(|claims| {
                claims.require_kind(TokenKind::Refresh)?;
                Ok(claims)
            })
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token failed verification");
                e.into_refresh_denied()
            })?;

        match self.users.find_by_id(&claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(user_id = %claims.sub, "Refresh token subject not found");
                Err(AuthError::RefreshDenied)
            }
        }
    }
}

/// Unwraps a required request field or fails validation.
fn require_field(value: Option<String>, name: &str) -> AuthResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::validation(format!("{name} is required"))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::User;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    /// Map-backed store with the same uniqueness rules a database would
    /// enforce.
    struct FakeUserStorage {
        users: RwLock<HashMap<String, User>>,
    }

    impl FakeUserStorage {
        fn empty() -> Arc<Self> {
            Arc::new(Self {
                users: RwLock::new(HashMap::new()),
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
            let mut users = self.users.write().await;
            if users.values().any(|u| u.username == new_user.username) {
                return Err(AuthError::conflict("username already taken"));
            }
            if let Some(ref email) = new_user.email
                && users.values().any(|u| u.email.as_deref() == Some(email))
            {
                return Err(AuthError::conflict("email already taken"));
            }
            let user = User::new(new_user.username, new_user.email, new_user.password_hash)
                .with_role(new_user.role);
            users.insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn upsert(&self, new_user: NewUser) -> AuthResult<User> {
            let mut users = self.users.write().await;
            if let Some(existing) = users
                .values_mut()
                .find(|u| u.username == new_user.username)
            {
                existing.email = new_user.email;
                existing.password_hash = new_user.password_hash;
                existing.role = new_user.role;
                existing.updated_at = time::OffsetDateTime::now_utc();
                return Ok(existing.clone());
            }
            let user = User::new(new_user.username, new_user.email, new_user.password_hash)
                .with_role(new_user.role);
            users.insert(user.id.clone(), user.clone());
            Ok(user)
        }
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        }
    }

    fn service_with(config: AuthConfig) -> (AuthService, Arc<TokenCodec>) {
        let codec = Arc::new(TokenCodec::new(&config.secret, &config.issuer));
        let service = AuthService::new(&config, codec.clone(), FakeUserStorage::empty());
        (service, codec)
    }

    fn service() -> AuthService {
        service_with(test_config()).0
    }

    fn alice_signup() -> SignupRequest {
        SignupRequest {
            email: Some("a@b.com".to_string()),
            username: Some("alice".to_string()),
            password: Some("secret1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_signup_issues_session_with_user_role() {
        let service = service();
        let (session, identity) = service.signup(alice_signup()).await.unwrap();

        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, Role::User);
        assert!(!session.is_dead());
        assert_ne!(session.access_token, session.refresh_token);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service();
        service.signup(alice_signup()).await.unwrap();

        let duplicate = SignupRequest {
            username: Some("alice2".to_string()),
            ..alice_signup()
        };
        let result = service.signup(duplicate).await;
        assert!(matches!(result, Err(AuthError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let service = service();
        service.signup(alice_signup()).await.unwrap();

        let duplicate = SignupRequest {
            email: Some("other@b.com".to_string()),
            ..alice_signup()
        };
        let result = service.signup(duplicate).await;
        assert!(matches!(result, Err(AuthError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_signup_rejects_missing_and_invalid_fields() {
        let service = service();

        let missing = SignupRequest {
            email: None,
            ..alice_signup()
        };
        assert!(matches!(
            service.signup(missing).await,
            Err(AuthError::Validation { .. })
        ));

        let short_password = SignupRequest {
            password: Some("12345".to_string()),
            ..alice_signup()
        };
        assert!(matches!(
            service.signup(short_password).await,
            Err(AuthError::Validation { .. })
        ));

        let bad_email = SignupRequest {
            email: Some("not-an-address".to_string()),
            ..alice_signup()
        };
        assert!(matches!(
            service.signup(bad_email).await,
            Err(AuthError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_roundtrip() {
        let service = service();
        service.signup(alice_signup()).await.unwrap();

        let (session, identity) = service
            .login(LoginRequest {
                username: Some("alice".to_string()),
                password: Some("secret1".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(identity.username, "alice");
        assert!(!session.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.signup(alice_signup()).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                username: Some("alice".to_string()),
                password: Some("wrong-password".to_string()),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginRequest {
                username: Some("nobody".to_string()),
                password: Some("secret1".to_string()),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_refresh_yields_matching_subject() {
        let (service, codec) = service_with(test_config());
        let (session, identity) = service.signup(alice_signup()).await.unwrap();

        let (new_session, refreshed) = service.refresh(&session.refresh_token).await.unwrap();

        assert_eq!(refreshed.id, identity.id);
        let claims = codec.decode(&new_session.access_token).unwrap();
        assert_eq!(claims.sub, identity.id);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_refresh_rotates_by_default() {
        let service = service();
        let (session, _) = service.signup(alice_signup()).await.unwrap();

        let (new_session, _) = service.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(new_session.refresh_token, session.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_without_rotation_carries_token_forward() {
        let config = AuthConfig {
            rotate_refresh_tokens: false,
            ..test_config()
        };
        let (service, _) = service_with(config);
        let (session, _) = service.signup(alice_signup()).await.unwrap();

        let (new_session, _) = service.refresh(&session.refresh_token).await.unwrap();
        assert_eq!(new_session.refresh_token, session.refresh_token);
        assert_ne!(new_session.access_token, session.access_token);
    }

    #[tokio::test]
    async fn test_refresh_with_access_token_fails_generically() {
        let service = service();
        let (session, _) = service.signup(alice_signup()).await.unwrap();

        let result = service.refresh(&session.access_token).await;
        assert!(matches!(result, Err(AuthError::RefreshDenied)));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_fails_generically() {
        let service = service();
        service.signup(alice_signup()).await.unwrap();

        let result = service.refresh("definitely.not.a.token").await;
        assert!(matches!(result, Err(AuthError::RefreshDenied)));
    }

    #[tokio::test]
    async fn test_logout_requires_valid_refresh_token() {
        let service = service();
        let (session, identity) = service.signup(alice_signup()).await.unwrap();

        let logged_out = service.logout(&session.refresh_token).await.unwrap();
        assert_eq!(logged_out.id, identity.id);

        assert!(matches!(
            service.logout(&session.access_token).await,
            Err(AuthError::RefreshDenied)
        ));
        assert!(matches!(
            service.logout("garbage").await,
            Err(AuthError::RefreshDenied)
        ));
    }

    #[tokio::test]
    async fn test_logout_does_not_revoke_outstanding_tokens() {
        // There is no server-side revocation list: a still-valid access
        // token issued before logout verifies until its own expiry.
        let (service, codec) = service_with(test_config());
        let (session, _) = service.signup(alice_signup()).await.unwrap();

        service.logout(&session.refresh_token).await.unwrap();
        assert!(codec.decode(&session.access_token).is_ok());
    }
}
