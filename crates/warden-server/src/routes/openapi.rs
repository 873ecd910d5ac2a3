//! OpenAPI documentation configuration.

use axum::Json;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use super::{auth, health, session};
use crate::error::ErrorResponse;

/// OpenAPI documentation for the Warden API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warden API",
        description = "Supervisor PIN login and session tokens",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health,
        auth::verify_pin_handler,
        auth::validate_token_handler,
        auth::logout_handler,
        session::get_session_handler,
    ),
    components(schemas(
        ErrorResponse,
        health::HealthResponse,
        auth::VerifyPinRequest,
        auth::VerifyPinResponse,
        auth::TokenRequest,
        auth::ValidateTokenResponse,
        auth::LogoutResponse,
        session::SessionInfoResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "PIN login and token lifecycle"),
        (name = "session", description = "Session introspection"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// GET /api-docs/openapi.json
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
