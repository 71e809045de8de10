// src/core/telemetry/queue.rs

use parking_lot::Mutex;
use std::collections::VecDeque;

/// An unbounded FIFO of telemetry lines, filled by the collector and drained
/// by the reporter.
#[derive(Debug, Default)]
pub struct TelemetryQueue {
    lines: Mutex<VecDeque<String>>,
}

impl TelemetryQueue {
    pub fn new() -> Self {
        Default::default()
    }

    /// Splits `payload` on `\n`, drops empty pieces and queues the rest.
    /// Returns how many lines were queued.
    pub fn push_payload(&self, payload: &str) -> usize {
        let mut pushed = 0;
        for token in payload.split('\n').filter(|t| !t.is_empty()) {
            self.lines.lock().push_back(token.to_string());
            pushed += 1;
        }
        pushed
    }

    /// Removes and returns every line queued at the moment of the call.
    pub fn drain(&self) -> Vec<String> {
        self.lines.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}
