// src/connection/mod.rs

//! Manages the lifecycle of a single chat client connection: the name
//! handshake, command dispatch and departure.

mod handler;
mod session;

pub use handler::ConnectionHandler;
pub use session::{SessionPhase, SessionState};
