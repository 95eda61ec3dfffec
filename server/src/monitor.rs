use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Loop de limpieza: cada `interval` borra los jobs terminales vencidos.
pub async fn run_retention_loop(state: AppState, interval: Duration) {
    loop {
        sleep(interval).await;
        sweep_once(&state);
    }
}

fn sweep_once(state: &AppState) {
    match state.registry.purge_expired() {
        Ok(0) => debug!("limpieza: ningún job vencido"),
        Ok(purged) => {
            let remaining = state.registry.len().unwrap_or_default();
            info!(
                "limpieza: {} jobs terminados borrados, quedan {}",
                purged, remaining
            );
        }
        Err(e) => warn!("error en limpieza de jobs: {}", e),
    }
}
