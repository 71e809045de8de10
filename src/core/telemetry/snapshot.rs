// src/core/telemetry/snapshot.rs

//! Derived usage metrics for one publish tick, and their wire format.

use crate::core::state::ChatState;
use std::fmt;
use std::time::Instant;

/// The usage metrics of one chat server at one publish tick.
///
/// The fields are read under separate directory lock acquisitions, so a join
/// or a message landing between two reads can make them mutually
/// inconsistent (for example a user count that already includes a session
/// whose first message is not yet in the rate). Consumers treat the snapshot
/// as eventually consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub port: u16,
    pub user_count: usize,
    /// Messages per second since the server started.
    pub usage_rate: f64,
    /// Same formula as `usage_rate`; both lines are kept on the wire for
    /// compatibility with existing collectors.
    pub average_messages: f64,
    /// Mean seconds since each session's last line.
    pub mean_gap_secs: f64,
    pub uptime_secs: f64,
}

/// Messages per second, or 0 before any time has elapsed.
pub fn message_rate(total_messages: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        total_messages as f64 / elapsed_secs
    } else {
        0.0
    }
}

impl TelemetrySnapshot {
    /// Computes a snapshot of `state` as of now.
    pub async fn capture(state: &ChatState) -> Self {
        let now = Instant::now();
        let uptime_secs = state.uptime_secs(now);
        let user_count = state.directory.len().await;
        let total_messages = state.directory.total_messages().await;
        let mean_gap_secs = state.directory.mean_gap_secs(now).await;
        let rate = message_rate(total_messages, uptime_secs);
        Self {
            port: state.port,
            user_count,
            usage_rate: rate,
            average_messages: rate,
            mean_gap_secs,
            uptime_secs,
        }
    }
}

/// Renders the datagram payload: one `\n`-terminated line per field, labels verbatim.
impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Servidor en el puerto: {}", self.port)?;
        writeln!(f, "Número de usuarios conectados: {}", self.user_count)?;
        writeln!(f, "Tasa de uso: {:.6} mensajes/segundo", self.usage_rate)?;
        writeln!(f, "Promedio de mensajes: {:.6} mensajes/segundo", self.average_messages)?;
        writeln!(f, "Tiempo promedio entre mensajes: {:.6} segundos", self.mean_gap_secs)?;
        writeln!(f, "Tiempo de actividad: {:.6} segundos", self.uptime_secs)
    }
}
