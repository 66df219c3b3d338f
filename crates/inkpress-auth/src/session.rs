//! Transport-level session.
//!
//! A session is the `{access token, refresh token}` pair plus the fields a
//! client needs to manage it: when the access token expires, and an error
//! marker set when a refresh attempt fails. A session with the error marker
//! is dead; the only recovery is re-authentication.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::token::TokenPair;

/// The marker a failed refresh leaves on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
    /// The refresh token was rejected; the session cannot be silently
    /// renewed and the user must authenticate again.
    RefreshAccessTokenError,
}

/// A client-visible session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Current access token.
    pub access_token: String,

    /// Current refresh token.
    pub refresh_token: String,

    /// When the access token expires; the client should refresh before
    /// this instant.
    #[serde(with = "time::serde::rfc3339")]
    pub access_token_expires_at: OffsetDateTime,

    /// Set when a refresh attempt failed. A session carrying this marker
    /// must be treated as dead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl Session {
    /// Builds a live session from a freshly issued pair.
    #[must_use]
    pub fn from_pair(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            access_token_expires_at: pair.access_token_expires_at,
            error: None,
        }
    }

    /// Builds a session that keeps the incoming refresh token (rotation
    /// disabled) around a new access token.
    #[must_use]
    pub fn renewed(
        access_token: String,
        refresh_token: String,
        access_token_expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_token_expires_at,
            error: None,
        }
    }

    /// Marks this session dead after a failed refresh.
    #[must_use]
    pub fn with_refresh_error(mut self) -> Self {
        self.error = Some(SessionError::RefreshAccessTokenError);
        self
    }

    /// Returns `true` when the session carries the refresh-failure marker.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_token_expires_at: OffsetDateTime::now_utc(),
            error: None,
        }
    }

    #[test]
    fn test_live_session_has_no_error_field() {
        let json = serde_json::to_string(&session()).unwrap();
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_dead_session_carries_marker() {
        let dead = session().with_refresh_error();
        assert!(dead.is_dead());

        let json = serde_json::to_string(&dead).unwrap();
        assert!(json.contains("\"error\":\"RefreshAccessTokenError\""));
    }
}
