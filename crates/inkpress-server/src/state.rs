//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use inkpress_auth::middleware::AuthState;
use inkpress_auth::{AuthService, CookieConfig};

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    /// Guard state consumed by the auth extractors.
    pub auth: AuthState,

    /// Signup/login/refresh/logout flows.
    pub service: Arc<AuthService>,

    /// Cookie attributes for the transport binding.
    pub cookies: CookieConfig,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
