//! End-to-end login, validation, expiry and logout over HTTP.

mod common;

use std::time::Duration;

use anyhow::Result;
use warden_server::ServerConfig;
use warden_session::StoreConfig;

use common::{TEST_PIN, TestServer, short_lived};

#[tokio::test]
async fn test_server_starts_and_responds_to_health() -> Result<()> {
    let server = TestServer::start().await?;

    assert!(server.health().await?, "Server should be healthy");

    let body: serde_json::Value = server.get("/health").send().await?.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["activeSessions"], 0);

    server.shutdown().await
}

#[tokio::test]
async fn test_login_validate_logout() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login().await?;
    assert_eq!(token.len(), 64);

    let body: serde_json::Value = server
        .post_json("/auth/validate-token", serde_json::json!({ "token": token }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["valid"], true);
    assert!(body["remainingMs"].as_i64().unwrap() > 0);

    let resp = server
        .get("/api/v1/session")
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["originAddress"], "127.0.0.1");

    let body: serde_json::Value = server
        .post_json("/auth/logout", serde_json::json!({ "token": token }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["success"], true);

    let resp = server
        .get("/api/v1/session")
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);

    server.shutdown().await
}

#[tokio::test]
async fn test_wrong_and_malformed_pin() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .post_json("/auth/verify-pin", serde_json::json!({ "pin": "0000" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);

    let resp = server
        .post_json("/auth/verify-pin", serde_json::json!({ "pin": "46981" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    assert!(server.store.is_empty());
    server.shutdown().await
}

#[tokio::test]
async fn test_token_expires_after_ttl() -> Result<()> {
    let server = TestServer::start_with(short_lived(1000, 60_000), ServerConfig::default()).await?;
    let token = server.login().await?;

    tokio::time::sleep(Duration::from_millis(500)).await;
    let body: serde_json::Value = server
        .post_json("/auth/validate-token", serde_json::json!({ "token": token }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["valid"], true);

    tokio::time::sleep(Duration::from_millis(700)).await;
    let body: serde_json::Value = server
        .post_json("/auth/validate-token", serde_json::json!({ "token": token }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["valid"], false);

    // Lazy expiry removed the entry
    assert!(server.store.is_empty());
    server.shutdown().await
}

#[tokio::test]
async fn test_sweep_removes_expired_without_access() -> Result<()> {
    let server = TestServer::start_with(short_lived(200, 100), ServerConfig::default()).await?;
    server.login().await?;
    server.login().await?;
    assert_eq!(server.store.len(), 2);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(server.store.len(), 0);

    server.shutdown().await
}

#[tokio::test]
async fn test_pin_attempts_rate_limited() -> Result<()> {
    let config = ServerConfig::default().with_pin_attempts(3, Duration::from_secs(900));
    let server = TestServer::start_with(StoreConfig::default(), config).await?;

    for _ in 0..3 {
        let resp = server
            .post_json("/auth/verify-pin", serde_json::json!({ "pin": "1111" }))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 401);
    }

    // Even the correct PIN is refused once the quota is spent
    let resp = server
        .post_json("/auth/verify-pin", serde_json::json!({ "pin": TEST_PIN }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 429);
    assert!(resp.headers().contains_key("retry-after"));

    server.shutdown().await
}

#[tokio::test]
async fn test_shutdown_stops_sweep() -> Result<()> {
    let server = TestServer::start().await?;
    assert!(server.store.is_running());

    let store = server.store.clone();
    server.shutdown().await?;
    assert!(!store.is_running());

    Ok(())
}
