// src/connection/handler.rs

//! Defines the `ConnectionHandler` which runs one chat session from accept to close.

use super::session::{SessionPhase, SessionState};
use crate::core::ChatError;
use crate::core::directory::{SessionId, SessionWriter};
use crate::core::protocol::{ChatCommand, ChatLineCodec, replies};
use crate::core::state::ChatState;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

pub struct ConnectionHandler<R> {
    lines: FramedRead<R, ChatLineCodec>,
    /// Owned by the handler until the session joins, then moved into the directory.
    writer: Option<SessionWriter>,
    addr: SocketAddr,
    state: Arc<ChatState>,
    session: SessionState,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(
        reader: R,
        writer: SessionWriter,
        addr: SocketAddr,
        state: Arc<ChatState>,
        session_id: SessionId,
    ) -> Self {
        let codec = ChatLineCodec::new(state.config.max_line_length);
        Self {
            lines: FramedRead::new(reader, codec),
            writer: Some(writer),
            addr,
            state,
            session: SessionState::new(session_id),
        }
    }

    /// Reads the next line. `Ok(None)` means the peer closed the connection.
    async fn next_line(&mut self) -> Result<Option<String>, ChatError> {
        match self.lines.next().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Runs the session to completion. A read error ends the session exactly
    /// like a disconnect and is then returned to the caller for logging.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        let name = match self.handshake().await {
            Ok(Some(name)) => name,
            Ok(None) => {
                self.session.advance(SessionPhase::Terminated);
                return Ok(());
            }
            Err(e) => {
                self.session.advance(SessionPhase::Terminated);
                return Err(e);
            }
        };

        let id = self.session.id;
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        if !self.state.directory.insert(id, name.clone(), writer).await {
            warn!("Session {} is already registered; closing {}.", id, self.addr);
            self.session.advance(SessionPhase::Terminated);
            return Ok(());
        }
        self.session.activate(name.clone());
        info!("{} joined the chat from {}.", name, self.addr);
        self.state
            .directory
            .broadcast(&replies::join_notice(&name), Some(id))
            .await;

        loop {
            let line = match self.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.leave(true).await;
                    return Ok(());
                }
                Err(e) => {
                    self.leave(true).await;
                    return Err(e);
                }
            };

            self.state
                .directory
                .record_message(id, Instant::now())
                .await;

            let state = self.state.clone();
            let directory = &state.directory;
            match ChatCommand::parse(&line) {
                ChatCommand::Users => {
                    directory.send_roster(id).await;
                }
                ChatCommand::Connection => {
                    directory.send_connection_count(id).await;
                }
                ChatCommand::Quit => {
                    self.leave(false).await;
                    return Ok(());
                }
                ChatCommand::Help => {
                    directory.send_to(id, replies::HELP_TEXT).await;
                }
                ChatCommand::Message(text) => {
                    let delivered = directory
                        .broadcast(&replies::chat_line(&name, text), Some(id))
                        .await;
                    debug!("Message from {} delivered to {} session(s).", name, delivered);
                }
            }
        }
    }

    /// Sends the name prompt and reads the display name. `Ok(None)` means the
    /// peer went away before naming itself.
    async fn handshake(&mut self) -> Result<Option<String>, ChatError> {
        if let Some(writer) = self.writer.as_mut() {
            let prompt = async {
                writer.write_all(replies::NAME_PROMPT.as_bytes()).await?;
                writer.flush().await
            };
            if let Err(e) = prompt.await {
                debug!("Failed to send the name prompt to {}: {}", self.addr, e);
            }
        }
        self.session.advance(SessionPhase::Naming);

        Ok(self
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    /// Removes the session from the directory and, for a disconnect, tells
    /// everyone else. Removing an already-removed session is a no-op.
    async fn leave(&mut self, announce: bool) {
        self.session.advance(SessionPhase::Terminated);
        let Some(name) = self.state.directory.remove(self.session.id).await else {
            return;
        };
        if announce {
            info!("{} disconnected from {}.", name, self.addr);
            self.state
                .directory
                .broadcast(&replies::leave_notice(&name), None)
                .await;
        } else {
            info!("{} left the chat from {}.", name, self.addr);
        }
    }
}
