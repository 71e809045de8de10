// src/core/telemetry/collector.rs

//! Receives telemetry datagrams from every supervised chat server.

use super::TelemetryQueue;
use crate::core::ChatError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::info;

pub struct TelemetryCollector {
    socket: UdpSocket,
    queue: Arc<TelemetryQueue>,
    max_datagram_size: usize,
}

impl TelemetryCollector {
    /// Binds the collector socket. Failing to bind is fatal for the collector.
    pub async fn bind(
        addr: SocketAddr,
        queue: Arc<TelemetryQueue>,
        max_datagram_size: usize,
    ) -> Result<Self, ChatError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| ChatError::bind(addr, e))?;
        Ok(Self {
            socket,
            queue,
            max_datagram_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives datagrams forever, queueing each non-empty line. Receive
    /// errors are ignored and the loop carries on.
    pub async fn run(self) {
        info!(
            "Telemetry collector listening on {}",
            self.socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".to_string())
        );
        let mut buf = vec![0u8; self.max_datagram_size];
        loop {
            if let Ok((len, _from)) = self.socket.recv_from(&mut buf).await {
                let payload = String::from_utf8_lossy(&buf[..len]);
                self.queue.push_payload(&payload);
            }
        }
    }
}
