// src/core/supervisor/slot.rs

//! The control loop for a single supervised chat-server instance.

use super::launcher::ProcessLauncher;
use super::probe::PortProbe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};

/// Where a slot is in its lifecycle. Only the slot's own task changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// The slot should be serving: it probes its port and runs a child.
    Active,
    /// The last child failed. The slot waits for the monitor to re-arm it.
    Down,
    /// The port was unavailable. The slot waits out the retry delay and probes again.
    Retrying,
}

/// One requested chat-server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub id: usize,
    pub port: u16,
}

/// A state change reported by a slot to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEvent {
    pub id: usize,
    pub state: SlotState,
}

/// Instructions the monitor sends to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCommand {
    Restart,
}

pub struct SlotWorker {
    spec: SlotSpec,
    state: SlotState,
    launcher: Arc<dyn ProcessLauncher>,
    probe: PortProbe,
    retry_delay: Duration,
    events: mpsc::Sender<SlotEvent>,
    commands: mpsc::Receiver<SlotCommand>,
}

impl SlotWorker {
    pub fn new(
        spec: SlotSpec,
        launcher: Arc<dyn ProcessLauncher>,
        probe: PortProbe,
        retry_delay: Duration,
        events: mpsc::Sender<SlotEvent>,
        commands: mpsc::Receiver<SlotCommand>,
    ) -> Self {
        Self {
            spec,
            state: SlotState::Active,
            launcher,
            probe,
            retry_delay,
            events,
            commands,
        }
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    async fn transition(&mut self, next: SlotState) {
        if self.state == next {
            return;
        }
        debug!(
            "Slot {} (port {}): {:?} -> {:?}",
            self.spec.id, self.spec.port, self.state, next
        );
        self.state = next;
        // A closed channel only means nobody is watching any more.
        let _ = self
            .events
            .send(SlotEvent {
                id: self.spec.id,
                state: next,
            })
            .await;
    }

    /// Runs one iteration of the control loop. Returns false once the slot can
    /// never make progress again, which only happens when it is down and the
    /// monitor has gone away.
    pub async fn step(&mut self) -> bool {
        let SlotSpec { id, port } = self.spec;
        match self.state {
            SlotState::Active => {
                if !self.probe.is_available(port) {
                    warn!(
                        "Port {} is not available for server {}. Retrying in {:?}...",
                        port, id, self.retry_delay
                    );
                    self.transition(SlotState::Retrying).await;
                    return true;
                }

                info!("Starting server {} on port {}", id, port);
                match self.launcher.run_to_exit(port).await {
                    Ok(exit) if exit.success() => {
                        info!("Server {} on port {} exited cleanly, relaunching.", id, port);
                    }
                    Ok(exit) => {
                        error!("Server {} on port {} stopped with {}.", id, port, exit);
                        self.fail().await;
                    }
                    Err(e) => {
                        error!("Server {} on port {} could not be run: {}", id, port, e);
                        self.fail().await;
                    }
                }
                true
            }
            SlotState::Retrying => {
                time::sleep(self.retry_delay).await;
                self.transition(SlotState::Active).await;
                true
            }
            SlotState::Down => match self.commands.recv().await {
                Some(SlotCommand::Restart) => {
                    info!("Restarting server {} on port {}...", id, port);
                    self.transition(SlotState::Active).await;
                    true
                }
                None => false,
            },
        }
    }

    async fn fail(&mut self) {
        self.transition(SlotState::Down).await;
        time::sleep(self.retry_delay).await;
    }

    /// Drives the slot forever. Ends early only if the launcher cannot work at
    /// all or the monitor has shut down.
    pub async fn run(mut self) {
        let SlotSpec { id, port } = self.spec;
        info!("Starting control loop for server {} on port {}", id, port);
        if let Err(e) = self.launcher.check() {
            error!("Server {} on port {} will not be started: {}", id, port, e);
            return;
        }
        let _ = self
            .events
            .send(SlotEvent {
                id,
                state: self.state,
            })
            .await;
        while self.step().await {}
        warn!("Control loop for server {} on port {} ended.", id, port);
    }
}
