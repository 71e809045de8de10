// src/core/protocol/mod.rs

//! The line-oriented chat protocol: command parsing and the fixed reply texts.

pub mod codec;
pub mod command;
pub mod replies;
pub use codec::ChatLineCodec;
pub use command::ChatCommand;
