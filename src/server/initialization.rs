// src/server/initialization.rs

//! Binds the chat listener and builds the server state.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::ChatError;
use crate::core::state::ChatState;
use anyhow::Result;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::info;

/// Binds the listening socket for `port` and prepares the server context.
/// A bind or listen failure is fatal and is returned as `ChatError::Bind`.
pub async fn setup(config: Config, port: u16) -> Result<ServerContext> {
    let ip: IpAddr = config.host.parse().map_err(|_| {
        ChatError::InvalidConfig(format!("host '{}' is not an IP address", config.host))
    })?;
    let addr = SocketAddr::new(ip, port);
    let listener = bind_listener(addr, config.backlog).map_err(|e| ChatError::bind(addr, e))?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(ChatState::new(config, local_addr.port()));
    info!(
        "Chat server started on port {}. Waiting for connections...",
        local_addr.port()
    );

    Ok(ServerContext {
        state,
        listener,
        background_tasks: JoinSet::new(),
    })
}

/// Creates a listener with address and port reuse enabled.
fn bind_listener(addr: SocketAddr, backlog: u32) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    #[cfg(unix)]
    socket.set_reuseport(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}
