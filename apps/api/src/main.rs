mod config;
mod errors;
mod layout;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{spawn_reaper, MasonryEngine};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Masonry API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the layout engine
    let engine_config = config.engine_config()?;
    let max_columns = engine_config.grid.breakpoints.max_columns();
    let engine = MasonryEngine::new(engine_config, config.size_policy()?)?;
    info!(
        policy = engine.policy_name(),
        seed = ?config.layout_seed,
        max_columns,
        debounce_ms = config.resize_debounce_ms,
        "Layout engine configured"
    );

    // Build app state
    let state = AppState::new(config.clone(), engine);

    // Evict abandoned grid sessions; a TTL of 0 keeps them until DELETE
    if config.grid_idle_ttl_secs > 0 {
        spawn_reaper(state.grids.clone(), config.grid_idle_ttl());
    }

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
