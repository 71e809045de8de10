// src/core/supervisor/monitor.rs

//! The fleet monitor: tracks every slot's reported state and re-arms slots that are down.

use super::slot::{SlotCommand, SlotEvent, SlotSpec, SlotState};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

struct MonitoredSlot {
    spec: SlotSpec,
    /// The monitor's view, updated from slot events and from its own restart requests.
    state: SlotState,
    commands: mpsc::Sender<SlotCommand>,
}

pub struct FleetMonitor {
    period: Duration,
    slots: Vec<MonitoredSlot>,
    events: mpsc::Receiver<SlotEvent>,
}

impl FleetMonitor {
    pub fn new(period: Duration, events: mpsc::Receiver<SlotEvent>) -> Self {
        Self {
            period,
            slots: Vec::new(),
            events,
        }
    }

    /// Starts tracking a slot. Slots begin in the active state.
    pub fn register(&mut self, spec: SlotSpec, commands: mpsc::Sender<SlotCommand>) {
        self.slots.push(MonitoredSlot {
            spec,
            state: SlotState::Active,
            commands,
        });
    }

    pub fn state_of(&self, id: usize) -> Option<SlotState> {
        self.slots.iter().find(|s| s.spec.id == id).map(|s| s.state)
    }

    /// Records a state reported by a slot.
    pub fn apply(&mut self, event: SlotEvent) {
        match self.slots.iter_mut().find(|s| s.spec.id == event.id) {
            Some(slot) => slot.state = event.state,
            None => warn!("Received an event for unknown server {}", event.id),
        }
    }

    /// Sends a restart to every slot currently seen as down and marks it
    /// active, so one failure leads to exactly one restart request. Returns
    /// the ids that were re-armed.
    pub fn restart_down_slots(&mut self) -> Vec<usize> {
        let mut restarted = Vec::new();
        for slot in self.slots.iter_mut() {
            debug!("Monitoring server {} ({:?})", slot.spec.id, slot.state);
            if slot.state != SlotState::Down {
                continue;
            }
            match slot.commands.try_send(SlotCommand::Restart) {
                Ok(()) => {
                    info!("Re-arming server {} on port {}...", slot.spec.id, slot.spec.port);
                    slot.state = SlotState::Active;
                    restarted.push(slot.spec.id);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Server {} control loop is gone; cannot restart it.", slot.spec.id);
                }
            }
        }
        restarted
    }

    /// Applies slot events as they arrive and re-arms down slots once per period.
    pub async fn run(mut self) {
        info!(
            "Fleet monitor started for {} server(s), checking every {:?}.",
            self.slots.len(),
            self.period
        );
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.restart_down_slots();
                }
                event = self.events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        warn!("All server control loops have ended; fleet monitor stopping.");
                        return;
                    }
                },
            }
        }
    }
}
