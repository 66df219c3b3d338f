//! Authentication configuration.
//!
//! Token lifetimes, the signing secret, cookie attributes, and the login
//! redirect location all live here. The server embeds [`AuthConfig`] as the
//! `[auth]` section of its application config.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! secret = "a-long-random-value"
//! issuer = "https://blog.example.com"
//! access_token_lifetime = "15m"
//! refresh_token_lifetime = "14d"
//! rotate_refresh_tokens = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder secret that must be replaced before the server will start.
pub const PLACEHOLDER_SECRET: &str = "change-me";

/// Minimum accepted signing secret length, in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Root authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric signing secret shared by every token the server mints.
    /// There is exactly one; access and refresh tokens differ by their
    /// signed `kind` claim, not by key.
    pub secret: String,

    /// Issuer embedded in every token (`iss` claim) and required back at
    /// verification time.
    pub issuer: String,

    /// Access token lifetime. Short: these authorize individual requests.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime. Long: these only mint new access tokens.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Whether a refresh call reissues the refresh token alongside the new
    /// access token. When false the incoming refresh token is carried
    /// forward unchanged.
    pub rotate_refresh_tokens: bool,

    /// Where page-level guards redirect unauthenticated visitors.
    pub login_path: String,

    /// Cookie transport settings.
    pub cookies: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_SECRET.to_string(),
            issuer: "http://localhost:8080".to_string(),
            access_token_lifetime: Duration::from_secs(15 * 60),
            refresh_token_lifetime: Duration::from_secs(14 * 24 * 60 * 60),
            rotate_refresh_tokens: true,
            login_path: "/login".to_string(),
            cookies: CookieConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting found.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret == PLACEHOLDER_SECRET {
            return Err("auth.secret must be set (placeholder value found)".into());
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "auth.secret must be at least {MIN_SECRET_LEN} bytes"
            ));
        }
        if self.access_token_lifetime.is_zero() || self.refresh_token_lifetime.is_zero() {
            return Err("auth token lifetimes must be > 0".into());
        }
        if self.access_token_lifetime >= self.refresh_token_lifetime {
            return Err("auth.access_token_lifetime must be shorter than refresh_token_lifetime".into());
        }
        if !self.login_path.starts_with('/') {
            return Err("auth.login_path must be an absolute path".into());
        }
        self.cookies.validate()
    }
}

/// Cookie names and attributes for the token transport.
///
/// Both cookies are HTTP-only. The refresh cookie path defaults to `/` for
/// compatibility; scoping it to the refresh/logout endpoints is the
/// recommended hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Name of the access-token cookie.
    pub access_name: String,

    /// Name of the refresh-token cookie.
    pub refresh_name: String,

    /// Path attribute of the access-token cookie.
    pub access_path: String,

    /// Path attribute of the refresh-token cookie.
    pub refresh_path: String,

    /// Whether cookies carry the `Secure` attribute. Disable only for
    /// plain-HTTP local development.
    pub secure: bool,

    /// SameSite attribute: `strict`, `lax`, or `none`.
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_name: "access_token".to_string(),
            refresh_name: "refresh_token".to_string(),
            access_path: "/".to_string(),
            refresh_path: "/".to_string(),
            secure: true,
            same_site: "lax".to_string(),
        }
    }
}

impl CookieConfig {
    /// Validates the cookie settings.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting found.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_name.is_empty() || self.refresh_name.is_empty() {
            return Err("cookie names must be non-empty".into());
        }
        if self.access_name == self.refresh_name {
            return Err("access and refresh cookies must have distinct names".into());
        }
        let ss = self.same_site.to_ascii_lowercase();
        if !matches!(ss.as_str(), "strict" | "lax" | "none") {
            return Err("cookies.same_site must be one of strict, lax, none".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_default_lifetimes() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(cfg.refresh_token_lifetime, Duration::from_secs(1_209_600));
        assert!(cfg.rotate_refresh_tokens);
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let cfg = AuthConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_valid_config_accepted() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let cfg = AuthConfig {
            secret: "short".to_string(),
            ..AuthConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let cfg = AuthConfig {
            access_token_lifetime: Duration::from_secs(3600),
            refresh_token_lifetime: Duration::from_secs(60),
            ..valid_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_cookie_names_rejected() {
        let mut cfg = valid_config();
        cfg.cookies.refresh_name = cfg.cookies.access_name.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_lifetimes_parse_from_humantime() {
        let toml = r#"
            secret = "toml-secret-0123456789abcdef"
            access_token_lifetime = "15m"
            refresh_token_lifetime = "14d"
        "#;
        let cfg: AuthConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(
            cfg.refresh_token_lifetime,
            Duration::from_secs(14 * 24 * 3600)
        );
    }
}
