//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use warden_server::{Server, ServerConfig};
use warden_session::{Authenticator, PinVerifier, SessionTokenStore, StoreConfig};

/// PIN accepted by every test server.
pub const TEST_PIN: &str = "4698";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Store shared with the running server.
    pub store: SessionTokenStore,
    /// Signals graceful shutdown.
    shutdown: Option<oneshot::Sender<()>>,
    /// Handle to the server task.
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a new test server with default configuration.
    pub async fn start() -> Result<Self> {
        Self::start_with(StoreConfig::default(), ServerConfig::default()).await
    }

    /// Start a test server with a custom store and server configuration.
    ///
    /// Logging and the global API limit are switched off; the PIN attempt
    /// limit stays as configured.
    pub async fn start_with(store_config: StoreConfig, config: ServerConfig) -> Result<Self> {
        let addr = find_available_port().await?;

        let store = SessionTokenStore::new(store_config);
        let verifier = PinVerifier::from_pin(TEST_PIN, "integration-salt")?;
        let auth = Authenticator::new(verifier, store.clone());

        let config = config
            .with_bind_address(addr)
            .with_rate_limiting(false)
            .with_request_logging(false);

        let (tx, rx) = oneshot::channel::<()>();
        let server = Server::new(auth, config);
        let handle = tokio::spawn(async move {
            let _ = server
                .run_with_shutdown(async {
                    let _ = rx.await;
                })
                .await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            store,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// POST a JSON body.
    pub fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .json(&body)
    }

    /// GET without credentials.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Log in with the test PIN and return the token.
    pub async fn login(&self) -> Result<String> {
        let resp = self
            .post_json("/auth/verify-pin", serde_json::json!({ "pin": TEST_PIN }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().is_success(), "login failed: {}", resp.status());

        let body: serde_json::Value = resp.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("no token in login response"))
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self.get("/health").send().await?;
        Ok(resp.status().is_success())
    }

    /// Shut the server down and wait for it to drain.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            timeout(Duration::from_secs(5), handle).await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Store config with short timings for expiry tests.
pub fn short_lived(ttl_ms: u64, sweep_ms: u64) -> StoreConfig {
    StoreConfig::default()
        .with_ttl(Duration::from_millis(ttl_ms))
        .with_sweep_interval(Duration::from_millis(sweep_ms))
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
