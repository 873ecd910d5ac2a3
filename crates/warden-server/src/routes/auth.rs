//! PIN login, token validation and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use warden_session::Validation;

use crate::error::{ErrorResponse, ServerError};
use crate::remote::ClientAddress;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response types
// ─────────────────────────────────────────────────────────────────────────────

/// PIN login request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyPinRequest {
    /// Four-digit supervisor PIN.
    #[serde(default)]
    pub pin: Option<String>,
}

/// Issued session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPinResponse {
    /// Opaque bearer token.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Request carrying a token in the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Token validation result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Milliseconds left before expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
}

impl ValidateTokenResponse {
    fn invalid() -> Self {
        Self {
            valid: false,
            expires_at: None,
            remaining_ms: None,
        }
    }
}

/// Logout result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /auth/verify-pin - Exchange the supervisor PIN for a session token.
#[utoipa::path(
    post,
    path = "/auth/verify-pin",
    request_body = VerifyPinRequest,
    responses(
        (status = 200, description = "PIN accepted", body = VerifyPinResponse),
        (status = 400, description = "PIN is not four digits", body = ErrorResponse),
        (status = 401, description = "Invalid PIN", body = ErrorResponse),
        (status = 429, description = "Too many attempts from this address", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn verify_pin_handler(
    State(state): State<AppState>,
    ClientAddress(origin): ClientAddress,
    payload: Result<Json<VerifyPinRequest>, JsonRejection>,
) -> Result<Json<VerifyPinResponse>, ServerError> {
    // A missing, non-string or unparseable PIN is a format error
    let pin = payload
        .ok()
        .and_then(|Json(req)| req.pin)
        .ok_or(ServerError::InvalidPinFormat)?;

    let issued = state.auth.verify_pin(&pin, origin)?;

    Ok(Json(VerifyPinResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// POST /auth/validate-token - Report whether a token is live.
///
/// Never fails on a bad token; the answer is `valid: false`.
#[utoipa::path(
    post,
    path = "/auth/validate-token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Validation result", body = ValidateTokenResponse),
    ),
    tag = "auth"
)]
pub async fn validate_token_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Json<ValidateTokenResponse> {
    let token = payload.ok().and_then(|Json(req)| req.token);
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Json(ValidateTokenResponse::invalid());
    };

    match state.auth.validate(&token) {
        Validation::Valid(session) => {
            let remaining = session.remaining_at(state.store().now());
            Json(ValidateTokenResponse {
                valid: true,
                expires_at: Some(session.expires_at),
                remaining_ms: Some(remaining.num_milliseconds()),
            })
        }
        Validation::Invalid => Json(ValidateTokenResponse::invalid()),
    }
}

/// POST /auth/logout - Revoke a token. Always succeeds.
#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Json<LogoutResponse> {
    if let Some(token) = payload.ok().and_then(|Json(req)| req.token) {
        state.auth.logout(&token);
    }

    Json(LogoutResponse { success: true })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
