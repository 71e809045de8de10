// src/core/telemetry/mod.rs

//! Lightweight usage telemetry pushed from every chat server to the supervisor.
//!
//! Each chat server runs a `TelemetryPublisher` that periodically sends one
//! datagram holding a rendered `TelemetrySnapshot`. In the supervisor process a
//! `TelemetryCollector` splits incoming datagrams into lines and queues them on
//! a `TelemetryQueue`, which a `TelemetryReporter` drains to the console.

pub mod collector;
pub mod publisher;
pub mod queue;
pub mod reporter;
pub mod snapshot;

pub use collector::TelemetryCollector;
pub use publisher::TelemetryPublisher;
pub use queue::TelemetryQueue;
pub use reporter::TelemetryReporter;
pub use snapshot::TelemetrySnapshot;
