// src/core/supervisor/probe.rs

use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpSocket;
use tracing::warn;

/// Checks whether a TCP port is free on one address by binding a throwaway
/// socket to it.
#[derive(Debug, Clone, Copy)]
pub struct PortProbe {
    ip: IpAddr,
}

impl PortProbe {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip }
    }

    /// Returns true if `port` can be bound on the probe address right now.
    /// The socket is closed before returning, so the answer can be stale by
    /// the time a server tries to use the port.
    pub fn is_available(&self, port: u16) -> bool {
        let socket = if self.ip.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        };
        let socket = match socket {
            Ok(socket) => socket,
            Err(e) => {
                warn!("Failed to create a socket to probe port {}: {}", port, e);
                return false;
            }
        };
        socket.bind(SocketAddr::new(self.ip, port)).is_ok()
    }
}
