// src/server/spawner.rs

//! Spawns the chat server's long-running background tasks.

use super::context::ServerContext;
use crate::core::telemetry::TelemetryPublisher;
use anyhow::anyhow;
use tracing::{info, warn};

/// Spawns all background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) {
    let state = ctx.state.clone();
    let telemetry = &state.config.telemetry;

    match telemetry.collector_socket_addr() {
        Ok(collector) => {
            let publisher = TelemetryPublisher::new(state.clone(), collector, telemetry.interval);
            ctx.background_tasks.spawn(async move {
                publisher.run().await;
                Err(anyhow!("Telemetry publisher exited unexpectedly."))
            });
        }
        Err(e) => warn!("Telemetry is disabled: {:#}", e),
    }

    info!("All background tasks have been spawned.");
}
