//! Rate limiting middleware using governor.
//!
//! Two limiters live on [`AppState`]: a per-address limiter on PIN
//! attempts that is always on, and a global limiter for the rest of the
//! API that follows `rate_limiting`.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use serde::Serialize;

use crate::remote::client_address;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiter type alias (uses default clock).
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Per-address limiter for PIN attempts.
pub type SharedPinRateLimiter = Arc<DefaultKeyedRateLimiter<IpAddr>>;

/// Rate limit error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitError {
    code: &'static str,
    message: String,
    retry_after_seconds: u64,
}

/// Tracked addresses above which idle entries are pruned.
const PIN_LIMITER_PRUNE_THRESHOLD: usize = 4096;

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Create a rate limiter with the specified requests per minute.
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(rpm)))
}

/// Create the PIN attempt limiter.
///
/// Each address gets a burst of `max_attempts`; spent attempts come back
/// at `window / max_attempts` intervals, so at most `max_attempts` land in
/// any one window.
pub fn create_pin_rate_limiter(max_attempts: u32, window: Duration) -> SharedPinRateLimiter {
    let burst = NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(window / burst.get())
        .map(|q| q.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_second(burst));
    Arc::new(RateLimiter::keyed(quota))
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Global rate limiting middleware for API endpoints.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    match state.api_limiter.check() {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = retry_after_secs(wait);

            tracing::warn!(
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Rate limit exceeded"
            );

            too_many_requests("Rate limit exceeded", retry_after)
        }
    }
}

/// Per-address limit on PIN verification.
///
/// Counts every attempt, successful or not.
pub async fn pin_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_address(
        request.headers(),
        request.extensions(),
        state.config.trust_proxy,
    );

    let limiter = &state.pin_limiter;
    if limiter.len() > PIN_LIMITER_PRUNE_THRESHOLD {
        limiter.retain_recent();
    }

    match limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = retry_after_secs(wait);

            tracing::warn!(
                origin = %ip,
                retry_after_seconds = retry_after,
                "PIN attempt limit exceeded"
            );

            too_many_requests(
                "Too many PIN attempts, please try again later",
                retry_after,
            )
        }
    }
}

/// Whole seconds to wait, rounded up, never zero.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

fn too_many_requests(message: &str, retry_after: u64) -> Response {
    let body = RateLimitError {
        code: "rate_limit_exceeded",
        message: message.to_string(),
        retry_after_seconds: retry_after,
    };

    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after.to_string())],
        Json(body),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Structured request logging middleware.
///
/// Logs method, path, status and duration. Tokens and PINs never appear
/// here since only the path is recorded.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
