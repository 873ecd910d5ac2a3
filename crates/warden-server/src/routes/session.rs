//! Current session details.

use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use warden_session::Session;

use crate::state::AppState;

/// Details of the session behind the request's token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Milliseconds left before expiry.
    pub remaining_ms: i64,
    /// Address the PIN was verified from.
    pub origin_address: String,
}

/// GET /api/v1/session - Describe the caller's session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Session details", body = SessionInfoResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "session"
)]
pub async fn get_session_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<SessionInfoResponse> {
    let remaining = session.remaining_at(state.store().now());

    Json(SessionInfoResponse {
        issued_at: session.issued_at,
        expires_at: session.expires_at,
        remaining_ms: remaining.num_milliseconds(),
        origin_address: session.origin_address.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session_middleware;
    use crate::config::ServerConfig;
    use crate::test_util::{TEST_PIN, test_state};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_get_session() {
        let (state, clock) = test_state(ServerConfig::default());
        let issued = state
            .auth
            .verify_pin(TEST_PIN, "192.168.1.20".parse().unwrap())
            .unwrap();
        clock.advance(Duration::from_secs(60));

        let app = Router::new()
            .route("/api/v1/session", get(get_session_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            ))
            .with_state(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .header("Authorization", format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let info: SessionInfoResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(info.origin_address, "192.168.1.20");
        assert_eq!(info.expires_at, issued.expires_at);
        assert_eq!(
            info.remaining_ms,
            (state.store().ttl() - Duration::from_secs(60)).as_millis() as i64
        );
    }
}
