mod config;
mod error;
mod extract;
mod handlers;
mod monitor;
mod state;

use anyhow::Result;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

pub const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG manda; si no está, logs de debug del server
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("server=debug,tower_http=info,axum=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    info!(
        "self_url base: {}, jobs terminados se guardan {:?}",
        config.public_base_url, config.result_ttl
    );

    let state = AppState::new(config);

    // router HTTP
    let app = handlers::build_router(state.clone());

    // limpieza de jobs vencidos en segundo plano
    tokio::spawn(monitor::run_retention_loop(
        state,
        RETENTION_SWEEP_INTERVAL,
    ));

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("server escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
