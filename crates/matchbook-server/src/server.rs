//! TCP listener, engine wiring and top-level server lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use matchbook_core::MatchingEngine;

use crate::config::{Config, STATS_INTERVAL_SECS};
use crate::session;

/// State shared by every connection task.
pub struct ServerState {
    pub engine: Arc<MatchingEngine>,
    pub active_connections: AtomicUsize,
}

impl ServerState {
    /// Build the engine with its logging callbacks installed.
    pub fn new() -> Arc<Self> {
        let engine = Arc::new(MatchingEngine::new());

        engine.set_order_callback(Box::new(|order| {
            let o = order.lock();
            info!("order update: {}", *o);
        }));
        engine.set_trade_callback(Box::new(|trade| {
            info!("trade executed: {trade}");
        }));

        Arc::new(ServerState {
            engine,
            active_connections: AtomicUsize::new(0),
        })
    }
}

/// Bind, serve and shut down gracefully on SIGINT/SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = ServerState::new();

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;

    info!(
        addr = %config.socket_addr(),
        max_clients = config.max_clients,
        "matchbook server listening"
    );

    let stats = tokio::spawn(stats_loop(state.clone()));

    tokio::select! {
        result = serve(listener, state, config.max_clients) => {
            stats.abort();
            result
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, stopping server");
            stats.abort();
            Ok(())
        }
    }
}

/// Accept loop: one task per connection, bounded by `max_clients`.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    max_clients: usize,
) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("accept")?;

        let active = state.active_connections.load(Ordering::Relaxed);
        if active >= max_clients {
            warn!(%peer, active, max_clients, "rejecting connection: client limit reached");
            drop(stream);
            continue;
        }

        state.active_connections.fetch_add(1, Ordering::Relaxed);
        info!(%peer, active = active + 1, "client connected");

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = session::run_session(stream, peer, state.clone()).await {
                error!(%peer, error = %e, "session ended with error");
            } else {
                info!(%peer, "client disconnected");
            }
            state.active_connections.fetch_sub(1, Ordering::Relaxed);
        });
    }
}

/// Periodic statistics summary, mirroring connection and engine counters.
async fn stats_loop(state: Arc<ServerState>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(STATS_INTERVAL_SECS));
    ticker.tick().await; // first tick fires immediately; skip it

    loop {
        ticker.tick().await;
        info!(
            active_connections = state.active_connections.load(Ordering::Relaxed),
            total_orders = state.engine.total_orders(),
            total_trades = state.engine.total_trades(),
            "server statistics"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
