//! Redirecting guards for server-rendered pages.
//!
//! These run the same state machine as the responding extractors in
//! [`crate::middleware::guard`], but a browser hitting a protected page
//! should land on the login page, not read a JSON error body, so every
//! rejection becomes an HTTP redirect to the configured login location.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};

use crate::storage::{Role, UserProjection};

use super::guard::{AuthState, authenticate};

/// Page guard for routes any authenticated user may view.
///
/// On any rejection the visitor is redirected to the login page; the
/// rejection reason is logged, never rendered.
pub struct PageAuth(pub UserProjection);

impl<S> FromRequestParts<S> for PageAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match authenticate(parts, &auth_state, None).await {
            Ok(identity) => Ok(Self(identity)),
            Err(e) => {
                tracing::debug!(error = %e, path = %parts.uri.path(), "Redirecting to login");
                Err(Redirect::to(&auth_state.login_path))
            }
        }
    }
}

/// Page guard for admin-only routes.
///
/// Non-admins and unauthenticated visitors are both redirected to the
/// login page.
pub struct PageAdmin(pub UserProjection);

impl<S> FromRequestParts<S> for PageAdmin
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match authenticate(parts, &auth_state, Some(Role::Admin)).await {
            Ok(identity) => Ok(Self(identity)),
            Err(e) => {
                tracing::debug!(error = %e, path = %parts.uri.path(), "Redirecting to login");
                Err(Redirect::to(&auth_state.login_path))
            }
        }
    }
}
