//! HTTP API for Warden supervisor sessions.
//!
//! Exposes PIN login, token validation and logout over JSON, plus a
//! session-protected API namespace.
//!
//! # Features
//!
//! - PIN verification with a per-address attempt limit
//! - Session tokens via `Authorization: Bearer`, `X-Session-Token` or body
//! - Global API rate limiting
//! - Request logging
//! - OpenAPI document at `/api-docs/openapi.json`
//!
//! # Example
//!
//! ```ignore
//! use warden_server::{Server, ServerConfig};
//! use warden_session::{Authenticator, PinVerifier, SessionTokenStore, StoreConfig};
//!
//! let verifier = PinVerifier::from_hash(&hash, &salt)?;
//! let store = SessionTokenStore::new(StoreConfig::default());
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! let server = Server::new(Authenticator::new(verifier, store), config);
//! server.run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod remote;
pub mod routes;
pub mod state;

pub use auth::{AuthError, SESSION_TOKEN_HEADER, session_middleware};
pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use ratelimit::{pin_rate_limit_middleware, rate_limit_middleware, request_logging_middleware};
pub use remote::ClientAddress;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use warden_session::Authenticator;

/// The Warden HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given authenticator and configuration.
    pub fn new(auth: Authenticator, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(auth, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Get the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::get;

        let router = Router::new()
            // Health routes (no auth required)
            .merge(routes::health_routes())
            .route("/api-docs/openapi.json", get(routes::openapi_handler))
            // Login and token lifecycle (no session required)
            .nest("/auth", self.auth_routes())
            // Session-protected API
            .nest("/api/v1", self.api_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            // Request logging (inner layer, runs first)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::request_logging_middleware,
            ))
            // Rate limiting (outer layer, runs before request logging)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::rate_limit_middleware,
            ))
            // TraceLayer for detailed HTTP tracing
            .layer(TraceLayer::new_for_http());

        let router = match self.cors_layer() {
            Some(cors) => router.layer(cors),
            None => router,
        };

        router.with_state(self.state.clone())
    }

    /// Auth routes. Only PIN verification counts against the attempt limit.
    fn auth_routes(&self) -> Router<AppState> {
        use axum::routing::post;

        Router::new()
            .route("/verify-pin", post(routes::verify_pin_handler))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::pin_rate_limit_middleware,
            ))
            .route("/validate-token", post(routes::validate_token_handler))
            .route("/logout", post(routes::logout_handler))
    }

    /// API routes (v1).
    ///
    /// All API routes require a live session.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::get;

        Router::new()
            .route("/session", get(routes::get_session_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::session_middleware,
            ))
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins = &self.state.config.cors_origins;
        if origins.is_empty() {
            return None;
        }

        let allow_origin = if origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(parsed)
        };

        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(SESSION_TOKEN_HEADER),
                ]),
        )
    }

    /// Run the server until the process is stopped.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    ///
    /// Starts the store's expiry sweep for the server's lifetime and stops
    /// it once the server has drained.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;

        let store = self.state.store().clone();
        store.start()?;

        let router = self.router();
        info!("Starting server on {}", addr);

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(format!("Server error: {}", e)));

        store.stop();
        info!("Server stopped");

        result
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{TEST_PIN, test_state};
    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_server() -> Server {
        let (state, _clock) = test_state(ServerConfig::default().with_request_logging(false));
        Server::from_state(state)
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let app = test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_then_protected_route() {
        let app = test_server()
            .router()
            .layer(MockConnectInfo(SocketAddr::from(([10, 1, 2, 3], 40000))));

        let response = app
            .clone()
            .oneshot(json_post(
                "/auth/verify-pin",
                serde_json::json!({ "pin": TEST_PIN }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .header("X-Session-Token", &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["originAddress"], "10.1.2.3");
    }

    #[tokio::test]
    async fn test_pin_quota_is_per_peer() {
        let (state, _clock) = test_state(
            ServerConfig::default()
                .with_request_logging(false)
                .with_pin_attempts(1, std::time::Duration::from_secs(900)),
        );
        let router = Server::from_state(state).router();
        let first_peer = router
            .clone()
            .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 1))));
        let second_peer = router.layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 2], 1))));

        let wrong_pin = || json_post("/auth/verify-pin", serde_json::json!({ "pin": "0000" }));

        let response = first_peer.clone().oneshot(wrong_pin()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = first_peer.oneshot(wrong_pin()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // The second peer still has its own attempt
        let response = second_peer.oneshot(wrong_pin()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_serve_stops_sweep_on_shutdown() {
        let server = test_server();
        let store = server.state().store().clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        server.serve(listener, async {}).await.unwrap();

        assert!(!store.is_running());
    }

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let app = test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pin_attempts_limited_but_validate_is_not() {
        let (state, _clock) = test_state(
            ServerConfig::default()
                .with_request_logging(false)
                .with_pin_attempts(2, std::time::Duration::from_secs(900)),
        );
        let app = Server::from_state(state)
            .router()
            .layer(MockConnectInfo(SocketAddr::from(([10, 9, 9, 9], 1))));

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(json_post(
                    "/auth/verify-pin",
                    serde_json::json!({ "pin": "0000" }),
                ))
                .await
                .unwrap();
            statuses.push(response.status());
        }
        assert_eq!(
            statuses,
            vec![
                StatusCode::UNAUTHORIZED,
                StatusCode::UNAUTHORIZED,
                StatusCode::TOO_MANY_REQUESTS
            ]
        );

        let response = app
            .oneshot(json_post(
                "/auth/validate-token",
                serde_json::json!({ "token": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_served() {
        let response = test_server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["info"]["title"], "Warden API");
    }

    #[test]
    fn test_cors_layer_only_with_origins() {
        assert!(test_server().cors_layer().is_none());

        let (state, _clock) = test_state(
            ServerConfig::default().with_cors_origins(vec!["http://localhost:5173".into()]),
        );
        assert!(Server::from_state(state).cors_layer().is_some());
    }
}
