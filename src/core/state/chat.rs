// src/core/state/chat.rs

use crate::config::Config;
use crate::core::directory::{SessionId, UserDirectory};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// The state of one chat-server process: its identity, its start time and its
/// user directory. Shared behind an `Arc` by the accept loop, every session
/// task and the telemetry publisher.
#[derive(Debug)]
pub struct ChatState {
    pub config: Config,
    /// The port this server was asked to listen on. Reported in telemetry.
    pub port: u16,
    pub started_at: Instant,
    pub directory: UserDirectory,
    session_id_counter: AtomicU64,
}

impl ChatState {
    pub fn new(config: Config, port: u16) -> Self {
        Self {
            config,
            port,
            started_at: Instant::now(),
            directory: UserDirectory::new(),
            session_id_counter: AtomicU64::new(0),
        }
    }

    /// Hands out the identifier for a newly accepted connection.
    pub fn next_session_id(&self) -> SessionId {
        self.session_id_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Seconds elapsed since this server started.
    pub fn uptime_secs(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started_at).as_secs_f64()
    }
}
