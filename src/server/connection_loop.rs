// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Accepts connections forever, running each session in its own task.
/// There is no stop path: the process runs until it is killed.
pub async fn run(mut ctx: ServerContext) {
    let mut client_tasks = JoinSet::new();

    loop {
        tokio::select! {
            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => error!("Background task failed: {}", e),
                    Err(e) => error!("Background task panicked: {e:?}"),
                }
            },

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!("Accepted new connection from: {}", addr);
                        let session_id = ctx.state.next_session_id();
                        let state = ctx.state.clone();
                        let (reader, writer) = socket.into_split();
                        client_tasks.spawn(async move {
                            let mut handler = ConnectionHandler::new(reader, Box::new(writer), addr, state, session_id);
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }
}
