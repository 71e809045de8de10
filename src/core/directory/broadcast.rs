// src/core/directory/broadcast.rs

//! Delivery of text to sessions: fan-out broadcasts and single-recipient replies.

use super::{SessionId, SessionWriter, UserDirectory};
use crate::core::protocol::replies;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes `text` to one client. A failure is logged and reported as `false`.
async fn deliver(id: SessionId, writer: &mut SessionWriter, text: &str) -> bool {
    let result = async {
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await
    }
    .await;
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send to session {}: {}", id, e);
            false
        }
    }
}

impl UserDirectory {
    /// Sends `text` verbatim to every session except `exclude`, in connection
    /// order, holding the lock for the whole fan-out. A failed send does not
    /// stop delivery to the others. Returns how many sends succeeded.
    pub async fn broadcast(&self, text: &str, exclude: Option<SessionId>) -> usize {
        let mut inner = self.inner.lock().await;
        let mut delivered = 0;
        for (id, session) in inner.sessions.iter_mut() {
            if Some(*id) == exclude {
                continue;
            }
            if deliver(*id, &mut session.writer, text).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Sends `text` to a single session. Returns false if the session is gone
    /// or the write failed.
    pub async fn send_to(&self, id: SessionId, text: &str) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get_mut(&id) {
            Some(session) => deliver(id, &mut session.writer, text).await,
            None => false,
        }
    }

    /// Replies to `id` with the roster, built and sent under one lock acquisition.
    pub async fn send_roster(&self, id: SessionId) -> bool {
        let mut inner = self.inner.lock().await;
        let roster = replies::roster(inner.sessions.values().map(|s| s.name.as_str()));
        match inner.sessions.get_mut(&id) {
            Some(session) => deliver(id, &mut session.writer, &roster).await,
            None => false,
        }
    }

    /// Replies to `id` with the current number of sessions.
    pub async fn send_connection_count(&self, id: SessionId) -> bool {
        let mut inner = self.inner.lock().await;
        let reply = replies::connection_count(inner.sessions.len());
        match inner.sessions.get_mut(&id) {
            Some(session) => deliver(id, &mut session.writer, &reply).await,
            None => false,
        }
    }
}
