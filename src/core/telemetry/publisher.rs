// src/core/telemetry/publisher.rs

//! The background task that pushes a snapshot to the collector on a fixed interval.

use super::TelemetrySnapshot;
use crate::core::ChatError;
use crate::core::state::ChatState;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

pub struct TelemetryPublisher {
    state: Arc<ChatState>,
    collector: SocketAddr,
    interval: Duration,
}

impl TelemetryPublisher {
    pub fn new(state: Arc<ChatState>, collector: SocketAddr, interval: Duration) -> Self {
        Self {
            state,
            collector,
            interval,
        }
    }

    /// Captures a snapshot and sends it as a single datagram from a fresh
    /// socket, which is dropped afterwards. Returns the number of bytes sent.
    pub async fn publish_once(&self) -> Result<usize, ChatError> {
        let local: SocketAddr = if self.collector.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        let payload = TelemetrySnapshot::capture(&self.state).await.to_string();
        let sent = socket.send_to(payload.as_bytes(), self.collector).await?;
        if sent != payload.len() {
            return Err(ChatError::Telemetry(format!(
                "datagram truncated: sent {sent} of {} bytes",
                payload.len()
            )));
        }
        Ok(sent)
    }

    /// Publishes immediately and then once per interval, forever. Send
    /// failures are logged and never retried.
    pub async fn run(self) {
        info!(
            "Telemetry publisher started, sending to {} every {:?}.",
            self.collector, self.interval
        );
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.publish_once().await {
                warn!("Failed to publish telemetry to {}: {}", self.collector, e);
            }
        }
    }
}
