//! Signed token encoding and decoding.
//!
//! Tokens are JWTs signed with HMAC-SHA256 under a single server-held
//! secret. The token kind (access vs refresh) lives *inside* the signed
//! payload, so a refresh token can never be replayed where an access token
//! is required even though both verify under the same key.
//!
//! Decoding fails with exactly one of three reasons ([`AuthError::Expired`],
//! [`AuthError::InvalidSignature`], [`AuthError::Malformed`]), kept distinct
//! rather than collapsed; callers decide how much of that detail to surface.
//!
//! The codec has no side effects: encoding and decoding are pure functions
//! of their input and the secret.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::{AuthError, AuthResult};
use crate::storage::{Role, UserProjection};

// =============================================================================
// Token Kind
// =============================================================================

/// The two kinds of credential the service mints.
///
/// Kind discrimination is an enum in the signed payload, checked by
/// exhaustive pattern matching after decode: a kind mismatch is a hard
/// failure in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential authorizing individual requests.
    Access,
    /// Long-lived credential used only to mint new access tokens.
    Refresh,
}

impl TokenKind {
    /// Returns the kind name as embedded in the payload.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Token Claims
// =============================================================================

/// The signed payload of an Inkpress token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer (server URL).
    pub iss: String,

    /// Subject: the user's unique ID.
    pub sub: String,

    /// Token kind. Signed, so it cannot be rewritten without invalidating
    /// the signature.
    pub kind: TokenKind,

    /// Username at issuance time. Carried for clients; the verification
    /// guard re-resolves identity from the store and does not trust it.
    pub username: String,

    /// Role at issuance time. Same caveat as `username`.
    pub role: Role,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// Requires the claims to be of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongKind`] on a mismatch.
    pub fn require_kind(&self, expected: TokenKind) -> AuthResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(AuthError::wrong_kind(expected.as_str()))
        }
    }

    /// Returns the expiration as an [`OffsetDateTime`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the timestamp is out of range.
    pub fn expires_at(&self) -> AuthResult<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|e| AuthError::malformed(format!("invalid exp timestamp: {e}")))
    }
}

// =============================================================================
// Token Codec
// =============================================================================

/// Encodes and decodes signed tokens.
///
/// Thread-safe (`Send + Sync`); one instance is shared across the server
/// behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl TokenCodec {
    /// Creates a codec over the server secret.
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Encodes a token of the given kind for the given subject.
    ///
    /// `iat` is stamped now, `exp` at now + `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if serialization fails (does not
    /// happen with well-formed claims).
    pub fn encode(
        &self,
        subject: &UserProjection,
        kind: TokenKind,
        ttl: Duration,
    ) -> AuthResult<String> {
        let now = OffsetDateTime::now_utc();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            sub: subject.id.clone(),
            kind,
            username: subject.username.clone(),
            role: subject.role,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::malformed(format!("failed to encode token: {e}")))
    }

    /// Decodes and verifies a token string.
    ///
    /// Verification checks the signature, the `exp` claim, and the issuer.
    /// The kind is *not* checked here; callers match on [`TokenClaims::kind`]
    /// or use [`TokenClaims::require_kind`].
    ///
    /// # Errors
    ///
    /// - [`AuthError::Expired`] when `exp` is in the past
    /// - [`AuthError::InvalidSignature`] when the signature does not verify
    /// - [`AuthError::Malformed`] for anything unparseable or with invalid
    ///   claims
    pub fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false; // No audience claim in these tokens

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Returns the issuer embedded in every token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

/// Maps `jsonwebtoken` errors onto the three codec failure reasons.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::malformed(err.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
