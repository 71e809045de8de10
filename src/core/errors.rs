// src/core/errors.rs

//! Defines the primary error type for the chat server and the fleet supervisor.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures surfaced by the library.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The listening socket could not be created, configured, bound or put into listen mode.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: Arc<std::io::Error>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The chat-server child process could not be started.
    #[error("Failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

// `std::io::Error` is not cloneable, so it is shared behind an Arc.
impl Clone for ChatError {
    fn clone(&self) -> Self {
        match self {
            ChatError::Io(e) => ChatError::Io(Arc::clone(e)),
            ChatError::Bind { addr, source } => ChatError::Bind {
                addr: *addr,
                source: Arc::clone(source),
            },
            ChatError::InvalidConfig(s) => ChatError::InvalidConfig(s.clone()),
            ChatError::Launch { program, reason } => ChatError::Launch {
                program: program.clone(),
                reason: reason.clone(),
            },
            ChatError::Telemetry(s) => ChatError::Telemetry(s.clone()),
        }
    }
}

impl ChatError {
    /// Wraps an I/O failure that happened while setting up a listener on `addr`.
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        ChatError::Bind {
            addr,
            source: Arc::new(source),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Io(Arc::new(e))
    }
}
