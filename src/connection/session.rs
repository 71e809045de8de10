// src/connection/session.rs

use crate::core::directory::SessionId;

/// The phases a chat session moves through, strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Accepted, prompt not yet sent.
    Connecting,
    /// Prompt sent, waiting for the display name.
    Naming,
    /// Named and registered in the directory.
    Active,
    Terminated,
}

impl SessionPhase {
    /// Whether a session may move from `self` to `next`.
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Connecting, Naming)
                | (Connecting, Terminated)
                | (Naming, Active)
                | (Naming, Terminated)
                | (Active, Terminated)
        )
    }
}

/// Per-connection state held by the `ConnectionHandler`.
#[derive(Debug)]
pub struct SessionState {
    pub id: SessionId,
    name: Option<String>,
    phase: SessionPhase,
}

impl SessionState {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            name: None,
            phase: SessionPhase::Connecting,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The display name, empty until the handshake completes.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Moves to `next` if the transition is legal. Returns whether it happened.
    pub fn advance(&mut self, next: SessionPhase) -> bool {
        if self.phase.can_advance_to(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Completes the handshake with `name`, entering the active phase.
    pub fn activate(&mut self, name: String) -> bool {
        if self.advance(SessionPhase::Active) {
            self.name = Some(name);
            true
        } else {
            false
        }
    }
}
