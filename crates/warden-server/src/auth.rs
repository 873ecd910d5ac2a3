//! Session token middleware.
//!
//! Gates protected routes on a live session. The token is taken from, in
//! order: `Authorization: Bearer <token>`, the `X-Session-Token` header,
//! then a `token` field in a JSON body.
//!
//! # Security
//!
//! Missing, unknown and expired tokens all produce the same 401 body, so a
//! caller cannot tell them apart.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use warden_session::Validation;

use crate::error::ErrorResponse;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token in headers or body.
    MissingToken,
    /// Token unknown, revoked or expired.
    InvalidToken,
    /// Body could not be buffered while looking for a token.
    BodyTooLarge,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing session token"),
            AuthError::InvalidToken => write!(f, "Invalid session token"),
            AuthError::BodyTooLarge => write!(f, "Request body too large"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Session check failed");

        let (status, code, message) = match self {
            AuthError::MissingToken | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
            }
            AuthError::BodyTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Request body too large",
            ),
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Alternate header carrying the session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

// ─────────────────────────────────────────────────────────────────────────────
// Token extraction
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenField {
    token: Option<String>,
}

/// Token from `Authorization: Bearer` or `X-Session-Token`.
pub fn header_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let alternate = || {
        headers
            .get(SESSION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    bearer
        .filter(|t| !t.is_empty())
        .or_else(|| alternate().filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// Token from a JSON body of the form `{"token": "..."}`.
fn body_token(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice::<TokenField>(bytes)
        .ok()
        .and_then(|f| f.token)
        .filter(|t| !t.is_empty())
}

/// Find the request's token, re-attaching any buffered body.
async fn extract_token(
    request: Request<Body>,
    limit: usize,
) -> Result<(Option<String>, Request<Body>), AuthError> {
    if let Some(token) = header_token(request.headers()) {
        return Ok((Some(token), request));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| AuthError::BodyTooLarge)?;
    let token = body_token(&bytes);

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Session middleware.
///
/// Validates the token exactly once and injects the
/// [`Session`](warden_session::Session) into request extensions for handlers.
pub async fn session_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let (token, mut request) = extract_token(request, state.config.max_body_size).await?;
    let token = token.ok_or(AuthError::MissingToken)?;

    match state.auth.validate(&token) {
        Validation::Valid(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        Validation::Invalid => Err(AuthError::InvalidToken),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
