//! Error response handling for the guard extractors.
//!
//! Implements `IntoResponse` for [`AuthError`]. Every token failure reads
//! the same to the client, and storage detail never leaves the server. The
//! precise reason is logged here, once, at the edge.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{AuthError, ErrorCategory};

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);

        match ErrorCategory::of(&self) {
            ErrorCategory::Internal => {
                tracing::error!(error = %self, "Request failed with internal error");
            }
            _ => {
                tracing::debug!(error = %self, status = %status, "Request rejected");
            }
        }

        let body = json!({
            "error": ErrorCategory::of(&self).to_string(),
            "message": message,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Maps an error onto (HTTP status, client-visible message).
///
/// "invalid or expired credentials" covers expiry, bad signatures,
/// malformed tokens, wrong kinds, and deleted subjects alike, so a caller
/// cannot probe which check failed.
fn error_details(error: &AuthError) -> (StatusCode, &'static str) {
    match error {
        AuthError::NoToken => (StatusCode::UNAUTHORIZED, "authentication required"),
        AuthError::Expired
        | AuthError::InvalidSignature
        | AuthError::Malformed { .. }
        | AuthError::WrongKind { .. }
        | AuthError::UnknownSubject { .. } => {
            (StatusCode::UNAUTHORIZED, "invalid or expired credentials")
        }
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid username or password"),
        AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, "insufficient privileges"),
        AuthError::RefreshDenied => (StatusCode::FORBIDDEN, "invalid or expired refresh token"),
        AuthError::Conflict { .. } => (StatusCode::CONFLICT, "username or email already taken"),
        AuthError::Validation { .. } => (StatusCode::BAD_REQUEST, "invalid request body"),
        AuthError::Storage { .. } | AuthError::PasswordHash { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// Builds the `WWW-Authenticate` header value for 401 responses.
fn build_www_authenticate_header(description: &str) -> String {
    format!("Bearer realm=\"inkpress\", error=\"invalid_token\", error_description=\"{description}\"")
}

// =============================================================================
// Tests
// =============================================================================
