//! Authentication and authorization error types.
//!
//! This module defines every failure the token subsystem can surface. The
//! taxonomy distinguishes more than callers are ever told: HTTP responses
//! collapse token failures into generic 401/403 bodies (see
//! [`crate::middleware::error`]), while the variants keep the precise reason
//! for server-side logging and for tests.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carried no access token at all.
    #[error("No access token provided")]
    NoToken,

    /// The token's `exp` claim is in the past.
    #[error("Token expired")]
    Expired,

    /// The token's signature does not verify against the server secret.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token cannot be parsed, or its claims are structurally invalid.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of what could not be parsed.
        message: String,
    },

    /// A token of one kind was presented where the other kind is required.
    #[error("Wrong token kind: expected {expected}")]
    WrongKind {
        /// The kind the caller required.
        expected: &'static str,
    },

    /// The token verified but its subject no longer exists in the store.
    #[error("Unknown subject: {subject}")]
    UnknownSubject {
        /// The subject identifier that failed to resolve.
        subject: String,
    },

    /// The authenticated user does not have the role the route requires.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of the missing privilege.
        message: String,
    },

    /// Login failed. Does not say whether the username or the password was
    /// wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A refresh or logout attempt failed. All causes (expired, malformed,
    /// wrong kind, unknown subject, missing cookie) collapse into this one
    /// variant so the client cannot probe which check failed.
    #[error("Invalid or expired refresh token")]
    RefreshDenied,

    /// A uniqueness constraint was violated (duplicate username or email).
    #[error("Conflict: {message}")]
    Conflict {
        /// Which field collided.
        message: String,
    },

    /// The request body is missing a field or a field failed validation.
    #[error("Validation failed: {message}")]
    Validation {
        /// Description of the invalid field.
        message: String,
    },

    /// The credential store failed. Detail is logged server-side and never
    /// included in a response body.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Password hashing or verification failed. This indicates a
    /// misconfiguration, not a user error, and is fatal for the request.
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Description of the hashing failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `WrongKind` error.
    #[must_use]
    pub fn wrong_kind(expected: &'static str) -> Self {
        Self::WrongKind { expected }
    }

    /// Creates a new `UnknownSubject` error.
    #[must_use]
    pub fn unknown_subject(subject: impl Into<String>) -> Self {
        Self::UnknownSubject {
            subject: subject.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `PasswordHash` error.
    #[must_use]
    pub fn password_hash(message: impl Into<String>) -> Self {
        Self::PasswordHash {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a token verification failure
    /// (expired, bad signature, unparseable, wrong kind).
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::Malformed { .. } | Self::WrongKind { .. }
        )
    }

    /// Returns `true` if this failure belongs to the authentication/
    /// authorization taxonomy (never retried, surfaced as 401/403).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::NoToken
                | Self::Expired
                | Self::InvalidSignature
                | Self::Malformed { .. }
                | Self::WrongKind { .. }
                | Self::UnknownSubject { .. }
                | Self::Forbidden { .. }
                | Self::InvalidCredentials
                | Self::RefreshDenied
        )
    }

    /// Returns `true` if this is a server-side failure (500 class).
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::PasswordHash { .. })
    }

    /// Collapses this error into the single refresh-failure reason shown to
    /// clients of the refresh/logout flow.
    #[must_use]
    pub fn into_refresh_denied(self) -> Self {
        match self {
            Self::Storage { .. } | Self::PasswordHash { .. } => self,
            _ => Self::RefreshDenied,
        }
    }
}

/// Coarse category used in response bodies and audit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401-class failures: the request is not authenticated.
    Unauthorized,
    /// 403-class failures: authenticated but not allowed.
    Forbidden,
    /// 4xx request errors (validation, conflicts).
    Request,
    /// 5xx server errors.
    Internal,
}

impl ErrorCategory {
    /// Classifies an error into its category.
    #[must_use]
    pub fn of(error: &AuthError) -> Self {
        match error {
            AuthError::NoToken
            | AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Malformed { .. }
            | AuthError::WrongKind { .. }
            | AuthError::UnknownSubject { .. }
            | AuthError::InvalidCredentials => Self::Unauthorized,
            AuthError::Forbidden { .. } | AuthError::RefreshDenied => Self::Forbidden,
            AuthError::Conflict { .. } | AuthError::Validation { .. } => Self::Request,
            AuthError::Storage { .. } | AuthError::PasswordHash { .. } => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Request => write!(f, "request"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_predicate() {
        assert!(AuthError::Expired.is_token_error());
        assert!(AuthError::InvalidSignature.is_token_error());
        assert!(AuthError::malformed("bad json").is_token_error());
        assert!(AuthError::wrong_kind("access").is_token_error());

        assert!(!AuthError::NoToken.is_token_error());
        assert!(!AuthError::storage("down").is_token_error());
    }

    #[test]
    fn test_auth_failure_predicate() {
        assert!(AuthError::NoToken.is_auth_failure());
        assert!(AuthError::RefreshDenied.is_auth_failure());
        assert!(AuthError::InvalidCredentials.is_auth_failure());

        assert!(!AuthError::conflict("email taken").is_auth_failure());
        assert!(!AuthError::password_hash("broken").is_auth_failure());
    }

    #[test]
    fn test_refresh_collapse_hides_cause() {
        for err in [
            AuthError::Expired,
            AuthError::InvalidSignature,
            AuthError::malformed("garbage"),
            AuthError::wrong_kind("refresh"),
            AuthError::unknown_subject("u-1"),
        ] {
            assert!(matches!(err.into_refresh_denied(), AuthError::RefreshDenied));
        }
    }

    #[test]
    fn test_refresh_collapse_keeps_internal_errors() {
        let err = AuthError::storage("connection reset").into_refresh_denied();
        assert!(matches!(err, AuthError::Storage { .. }));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ErrorCategory::of(&AuthError::Expired),
            ErrorCategory::Unauthorized
        );
        assert_eq!(
            ErrorCategory::of(&AuthError::forbidden("admin only")),
            ErrorCategory::Forbidden
        );
        assert_eq!(
            ErrorCategory::of(&AuthError::conflict("username taken")),
            ErrorCategory::Request
        );
        assert_eq!(
            ErrorCategory::of(&AuthError::storage("down")),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCategory::Unauthorized.to_string(), "unauthorized");
    }
}
