// src/core/state/mod.rs

//! Defines the central `ChatState` shared by every task of one chat server.

mod chat;

pub use chat::ChatState;
