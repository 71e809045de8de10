// src/core/telemetry/reporter.rs

use super::TelemetryQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Periodically prints and discards every queued telemetry line.
pub struct TelemetryReporter {
    queue: Arc<TelemetryQueue>,
    period: Duration,
}

impl TelemetryReporter {
    pub fn new(queue: Arc<TelemetryQueue>, period: Duration) -> Self {
        Self { queue, period }
    }

    /// Drains the queue once, printing each line to stdout. Lines queued after
    /// the drain starts wait for the next call. Returns the lines printed.
    pub fn report(&self) -> Vec<String> {
        let lines = self.queue.drain();
        for line in &lines {
            println!("{line}");
        }
        lines
    }

    /// Reports once per period, starting one period from now.
    pub async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.report();
        }
    }
}
