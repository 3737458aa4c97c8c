//! pairlink Relay Server
//!
//! Pairs a controller and a peer by room code and relays messages between
//! them over WebSocket.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use pairlink_core::config::load_config;
use pairlink_core::tracing_init::init_tracing;
use pairlink_relay::transport::{AppState, build_router};

#[derive(Parser, Debug)]
#[command(name = "pairlink-relay")]
#[command(version, about = "pairlink relay server - room pairing and message relay")]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "PAIRLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file).
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Expire rooms nobody joined after this many seconds.
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("pairlink_relay=info,tower_http=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.listen_addr = addr;
    }
    if let Some(secs) = args.idle_timeout {
        config.sessions.idle_timeout_secs = Some(secs);
    }
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.listen_addr,
        "Starting pairlink-relay"
    );

    let state = AppState::from_config(&config);

    let sweeper = config.sessions.idle_timeout().map(|max_age| {
        info!(idle_timeout_secs = max_age.as_secs(), "Idle room expiry enabled");
        state
            .dispatcher
            .spawn_idle_sweeper(max_age, config.sessions.sweep_interval())
    });

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr).await?;
    info!(addr = %listener.local_addr()?, "Relay listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Relay stopped");
    Ok(())
}
