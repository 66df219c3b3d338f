//! User-facing authentication endpoints.
//!
//! | Route                  | Behavior                                        |
//! |------------------------|-------------------------------------------------|
//! | `POST /users`          | signup: 201 + pair, 409 on duplicates           |
//! | `POST /users/log-in`   | login: 200 + pair, 401 on bad credentials       |
//! | `POST /users/refresh`  | body or cookie refresh token: 200 + pair, 403   |
//! | `POST /users/log-out`  | cookie refresh token: 302 home, cookies cleared |
//! | `GET /users/me`        | access token: 200 + identity projection         |
//!
//! Every success that carries tokens also sets the session cookies, so
//! browser clients and API clients share one contract.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use inkpress_auth::middleware::AuthUser;
use inkpress_auth::{
    AuthError, LoginRequest, Session, SignupRequest, UserProjection, transport,
};

use crate::state::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// Body returned by every token-issuing endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    access_token: String,
    refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    access_token_expires_at: time::OffsetDateTime,
    data: UserProjection,
}

impl SessionResponse {
    fn new(session: &Session, identity: UserProjection) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            access_token_expires_at: session.access_token_expires_at,
            data: identity,
        }
    }
}

/// Wrapper for endpoints that return only the identity projection.
#[derive(Debug, Serialize)]
pub struct DataResponse {
    data: UserProjection,
}

/// Builds a token-issuing response: JSON body plus both session cookies.
fn session_response(
    state: &AppState,
    status: StatusCode,
    session: &Session,
    identity: UserProjection,
) -> Response {
    let cookies = transport::session_cookies(session, &state.cookies);
    let headers = AppendHeaders(
        cookies
            .into_iter()
            .map(|c| (header::SET_COOKIE, c))
            .collect::<Vec<_>>(),
    );

    (
        status,
        headers,
        Json(SessionResponse::new(session, identity)),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /users`: signup.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Response, AuthError> {
    let (session, identity) = state.service.signup(body).await?;
    Ok(session_response(
        &state,
        StatusCode::CREATED,
        &session,
        identity,
    ))
}

/// `POST /users/log-in`: login.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let (session, identity) = state.service.login(body).await?;
    Ok(session_response(&state, StatusCode::OK, &session, identity))
}

/// Refresh request body. The token may instead come from the refresh
/// cookie; an explicit body value wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: Option<String>,
}

/// `POST /users/refresh`: exchange a refresh token for a new session.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshBody>>,
) -> Result<Response, AuthError> {
    let from_body = body.and_then(|Json(b)| b.refresh_token);
    let token = from_body
        .or_else(|| transport::read_refresh_token(&headers, &state.cookies))
        .ok_or(AuthError::RefreshDenied)?;

    let (session, identity) = state.service.refresh(&token).await?;
    Ok(session_response(&state, StatusCode::OK, &session, identity))
}

/// `POST /users/log-out`: verify the refresh cookie, then clear both
/// cookies and send the browser home.
///
/// Verification comes first: a request without a valid refresh token gets
/// a 403, not a silent clear.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let token = transport::read_refresh_token(&headers, &state.cookies)
        .ok_or(AuthError::RefreshDenied)?;

    state.service.logout(&token).await?;

    let cleared = transport::clear_session_cookies(&state.cookies);
    let headers = AppendHeaders(
        cleared
            .into_iter()
            .map(|c| (header::SET_COOKIE, c))
            .collect::<Vec<_>>(),
    );

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, "/")],
        headers,
    )
        .into_response())
}

/// `GET /users/me`: the authenticated identity, re-read from the store by
/// the guard rather than echoed from the token.
pub async fn me(AuthUser(identity): AuthUser) -> Json<DataResponse> {
    Json(DataResponse { data: identity })
}
