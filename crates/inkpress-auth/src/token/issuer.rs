//! Token pair issuance.
//!
//! Login and signup produce one matched access/refresh pair, minted from a
//! single identity snapshot. The two tokens share a subject but nothing
//! else: independent kinds, independent lifetimes.

use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::config::AuthConfig;
use crate::error::AuthResult;
use crate::storage::UserProjection;
use crate::token::codec::{TokenCodec, TokenKind};

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,

    /// Long-lived refresh token.
    pub refresh_token: String,

    /// When the access token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub access_token_expires_at: OffsetDateTime,

    /// When the refresh token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_token_expires_at: OffsetDateTime,
}

/// Mints matched token pairs with configured lifetimes.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    /// Creates an issuer from configuration.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, config: &AuthConfig) -> Self {
        Self {
            codec,
            access_lifetime: Duration::seconds(config.access_token_lifetime.as_secs() as i64),
            refresh_lifetime: Duration::seconds(config.refresh_token_lifetime.as_secs() as i64),
        }
    }

    /// Issues a matched pair for one identity snapshot.
    ///
    /// Both tokens carry the same subject; the caller must not mix
    /// projections from different lookups.
    ///
    /// # Errors
    ///
    /// Propagates codec encoding failures.
    pub fn issue_pair(&self, subject: &UserProjection) -> AuthResult<TokenPair> {
        let now = OffsetDateTime::now_utc();
        let access_token = self
            .codec
            .encode(subject, TokenKind::Access, self.access_lifetime)?;
        let refresh_token = self
            .codec
            .encode(subject, TokenKind::Refresh, self.refresh_lifetime)?;

        tracing::debug!(
            user_id = %subject.id,
            access_ttl_secs = self.access_lifetime.whole_seconds(),
            refresh_ttl_secs = self.refresh_lifetime.whole_seconds(),
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_token_expires_at: now + self.access_lifetime,
            refresh_token_expires_at: now + self.refresh_lifetime,
        })
    }

    /// Issues a single access token, used by the refresh flow when rotation
    /// is disabled.
    ///
    /// # Errors
    ///
    /// Propagates codec encoding failures.
    pub fn issue_access(&self, subject: &UserProjection) -> AuthResult<(String, OffsetDateTime)> {
        let now = OffsetDateTime::now_utc();
        let token = self
            .codec
            .encode(subject, TokenKind::Access, self.access_lifetime)?;
        Ok((token, now + self.access_lifetime))
    }

    /// The configured access token lifetime.
    #[must_use]
    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    /// The configured refresh token lifetime.
    #[must_use]
    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }
}
