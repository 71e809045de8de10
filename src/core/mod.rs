// src/core/mod.rs

//! The central module containing the core logic and data structures.

pub mod directory;
pub mod errors;
pub mod protocol;
pub mod state;
pub mod supervisor;
pub mod telemetry;

pub use errors::ChatError;
pub use protocol::ChatCommand;
