// src/core/directory/mod.rs

//! The shared registry of connected sessions for one chat server.
//!
//! Every read or write of the session list, the per-session activity time and
//! the global message counter goes through the single `tokio::sync::Mutex`
//! held by `UserDirectory`. Sends to clients also happen under that lock, so a
//! slow peer delays everyone else's replies and broadcasts.

mod broadcast;

use indexmap::IndexMap;
use std::time::Instant;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tracing::debug;

/// Identifies one accepted connection for the lifetime of the process.
pub type SessionId = u64;

/// The write half of a client connection.
pub type SessionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One named participant.
pub struct Session {
    pub name: String,
    writer: SessionWriter,
    /// When this session last sent a line, or when it joined if it has not.
    pub last_message_at: Instant,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("last_message_at", &self.last_message_at)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct DirectoryInner {
    /// Insertion order is connection order.
    sessions: IndexMap<SessionId, Session>,
    total_messages: u64,
}

/// The lock-protected session registry and message counter.
#[derive(Default)]
pub struct UserDirectory {
    inner: Mutex<DirectoryInner>,
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory").finish_non_exhaustive()
    }
}

impl UserDirectory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a session. Returns false, leaving the directory untouched, if
    /// `id` is already present.
    pub async fn insert(&self, id: SessionId, name: String, writer: SessionWriter) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.sessions.contains_key(&id) {
            return false;
        }
        inner.sessions.insert(
            id,
            Session {
                name,
                writer,
                last_message_at: Instant::now(),
            },
        );
        true
    }

    /// Removes a session and returns its name, or `None` if it was already gone.
    /// The order of the remaining sessions is preserved.
    pub async fn remove(&self, id: SessionId) -> Option<String> {
        let removed = self.inner.lock().await.sessions.shift_remove(&id);
        if removed.is_none() {
            debug!("Session {} was not in the directory upon removal.", id);
        }
        removed.map(|session| session.name)
    }

    /// Counts one received line and stamps the sender's activity time.
    /// Returns the new total.
    pub async fn record_message(&self, id: SessionId, at: Instant) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.total_messages += 1;
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.last_message_at = at;
        }
        inner.total_messages
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.inner.lock().await.sessions.contains_key(&id)
    }

    /// The display names of all sessions, in connection order.
    pub async fn names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.sessions.values().map(|s| s.name.clone()).collect()
    }

    pub async fn total_messages(&self) -> u64 {
        self.inner.lock().await.total_messages
    }

    /// The mean time, in seconds, between `now` and each session's last line.
    /// Sessions whose last activity is exactly `now` are skipped; with none
    /// left the result is 0.
    pub async fn mean_gap_secs(&self, now: Instant) -> f64 {
        let inner = self.inner.lock().await;
        let (total, count) = inner
            .sessions
            .values()
            .filter(|s| s.last_message_at != now)
            .fold((0.0_f64, 0_u32), |(total, count), s| {
                (
                    total + now.saturating_duration_since(s.last_message_at).as_secs_f64(),
                    count + 1,
                )
            });
        if count > 0 { total / f64::from(count) } else { 0.0 }
    }
}
