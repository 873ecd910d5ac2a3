//! API routes.

pub mod auth;
pub mod health;
pub mod openapi;
pub mod session;

pub use auth::{
    LogoutResponse, TokenRequest, ValidateTokenResponse, VerifyPinRequest, VerifyPinResponse,
    logout_handler, validate_token_handler, verify_pin_handler,
};
pub use health::health_routes;
pub use openapi::{ApiDoc, openapi_handler};
pub use session::{SessionInfoResponse, get_session_handler};
