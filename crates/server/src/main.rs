// crates/server/src/main.rs
//! The process entry point: load config, connect to the database, run the
//! loader's initial pass (§4.3), subscribe to change channels (§4.4), spawn
//! the scheduled duties (§4.9, §4.10, §6), and serve the HTTP surface (§6).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use warden_cache::Engine;
use warden_db::{notify::ChangeSubscriber, Database};
use warden_server::{config::Config, create_app, init_metrics, scheduler, state::AppState};
use warden_tracker::TrackerRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    init_metrics();

    let config = Config::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(port = config.port, forward_window_days = config.forward_window_days, "starting warden");

    let db = Database::connect(&config.database_url, 10).await.context("connecting to database")?;
    let engine = Engine::new(db.clone(), config.forward_window_days);

    // §4.3: no reads may be served until the initial load completes.
    engine.load_initial().await.context("initial cache load failed")?;
    tracing::info!("initial cache load complete");

    // §4.4: the dedicated long-lived LISTEN connection. Connecting after
    // the initial load means events between "load finished" and "subscribe
    // established" are missed; the spec documents this as an accepted,
    // small staleness window (§4.3: "serving before subscribe is
    // acceptable but the implementation must document the tiny staleness
    // window").
    let subscriber = ChangeSubscriber::connect(&config.database_url).await.context("connecting change subscriber")?;

    let tracker = TrackerRegistry::new(config.rule_tracker_staleness_minutes);
    let state = AppState::new(config, db, engine, tracker);

    scheduler::spawn_subscriber_loop(state.clone(), subscriber);
    scheduler::spawn_rotation_loop(state.clone());
    scheduler::spawn_session_persistence_loop(state.clone());
    scheduler::spawn_rule_tracker_sweep_loop(state.clone());
    scheduler::spawn_cleanup_loop(state.clone());

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding listener")?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.context("server error")?;

    Ok(())
}

/// Waits for SIGINT or SIGTERM so `axum::serve` can finish in-flight
/// requests (including aggregate-persistence writes the 5-minute scheduler
/// loop is mid-way through) before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}
