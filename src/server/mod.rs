// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod spawner;

pub use context::ServerContext;
pub use initialization::setup;

/// The chat server startup function: bind, spawn background tasks, serve.
/// Only returns if startup fails.
pub async fn run(config: Config, port: u16) -> Result<()> {
    // 1. Bind the listener and build the shared state.
    let server_context = initialization::setup(config, port).await?;

    // 2. Serve forever.
    serve(server_context).await;

    Ok(())
}

/// Spawns the background tasks of an already bound server and runs its accept loop.
pub async fn serve(mut ctx: ServerContext) {
    spawner::spawn_all(&mut ctx);
    connection_loop::run(ctx).await;
}
