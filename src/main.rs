use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lattice_api::{app, config, state::AppState};

#[derive(Debug, Parser)]
#[command(name = "lattice-api", about = "Multi-tenant SaaS API request pipeline")]
struct Args {
    /// Port to listen on (overrides LATTICE_API_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Bypass the identity provider with a fixed synthetic identity
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up APP_ENV, AUTH_OFFLINE_MODE, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    // Must happen before the first config access fixes the singleton.
    if args.offline {
        std::env::set_var("AUTH_OFFLINE_MODE", "true");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting Lattice API in {:?} mode", config.environment);
    if config.auth.offline_mode {
        tracing::warn!("offline mode enabled: identity verification is bypassed");
    }

    let state = AppState::in_memory();
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = args
        .port
        .or_else(|| std::env::var("LATTICE_API_PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Lattice API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
