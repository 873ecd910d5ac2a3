//! Start command - launches the Warden server.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};

use anyhow::{Context as _, Result};
use clap::Args;

use warden_config::{PinCredential, ResolvedCredential};
use warden_server::{Server, ServerConfig};
use warden_session::{Authenticator, PinVerifier, SessionTokenStore, StoreConfig};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values and environment overrides.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Session lifetime in milliseconds (overrides config)
    #[arg(long)]
    pub token_ttl_ms: Option<u64>,

    /// Take client addresses from X-Forwarded-For (overrides config)
    #[arg(long)]
    pub trust_proxy: bool,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = &ctx.loaded;
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + env + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    let mut config = loaded.config.clone();
    for warning in config.apply_env_overrides() {
        eprintln!("warning: {}", warning);
    }

    let mut server_section = config.server_or_default();
    let mut auth = config.auth_or_default();

    if let Some(port) = args.port {
        server_section.port = port;
    }
    if let Some(bind) = args.bind {
        server_section.bind = bind;
    }
    if let Some(ttl_ms) = args.token_ttl_ms {
        auth.token_ttl_ms = ttl_ms;
    }
    if args.trust_proxy {
        server_section.trust_proxy = true;
    }

    auth.validate()?;

    // ── Resolve the supervisor PIN ──────────────────────────────────────

    let resolved = warden_config::resolve_pin_credential(&auth)?;
    if resolved.is_plaintext() {
        eprintln!(
            "warning: PIN supplied in plaintext via {}; prefer a pin_hash from `warden hash-pin`",
            resolved.source
        );
    }
    let verifier = build_verifier(&resolved)?;

    // ── Build the store and server ──────────────────────────────────────

    let store_config = StoreConfig::default()
        .with_ttl(auth.token_ttl())
        .with_sweep_interval(auth.sweep_interval());
    store_config.validate()?;
    let store = SessionTokenStore::new(store_config);

    let ip: IpAddr = server_section
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", server_section.bind))?;
    let addr = SocketAddr::new(ip, server_section.port);

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_rate_limiting(server_section.rate_limiting)
        .with_api_rpm(server_section.api_rpm)
        .with_request_logging(server_section.request_logging)
        .with_trust_proxy(server_section.trust_proxy)
        .with_cors_origins(server_section.cors_origins.clone())
        .with_pin_attempts(auth.max_pin_attempts, auth.pin_window());

    if !ctx.json_output {
        println!("Bind address: {}", addr);
        println!("PIN from: {}", resolved.source);
        println!("Session TTL: {}ms", auth.token_ttl_ms);
    }

    let server = Server::new(Authenticator::new(verifier, store), server_config);
    server.run_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

fn build_verifier(resolved: &ResolvedCredential) -> Result<PinVerifier> {
    let verifier = match &resolved.credential {
        PinCredential::Hash { hash, salt } => PinVerifier::from_hash(hash, salt)
            .with_context(|| format!("invalid PIN hash from {}", resolved.source))?,
        PinCredential::Plain { pin, salt } => PinVerifier::from_pin(pin, salt)
            .with_context(|| format!("invalid PIN from {}", resolved.source))?,
    };
    Ok(verifier)
}

/// Resolves on Ctrl-C.
fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    }
}
