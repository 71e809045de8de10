// src/core/protocol/command.rs

//! Parses a received chat line into the action the session should take.

/// Lists the names of every connected user.
pub const USERS_COMMAND: &str = "@usuarios";
/// Reports how many users are connected.
pub const CONNECTION_COMMAND: &str = "@conexion";
/// Leaves the chat.
pub const QUIT_COMMAND: &str = "@salir";
/// Any line starting with this prefix asks for the help text.
pub const HELP_PREFIX: &str = "@h";

/// A line received from an active session, classified by its prefix.
///
/// Matching is by prefix only, so `@usuarios ahora` is still a roster request
/// and `@hola` is a help request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Users,
    Connection,
    Quit,
    Help,
    /// Ordinary chat text to relay to everyone else.
    Message(&'a str),
}

impl<'a> ChatCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.starts_with(USERS_COMMAND) {
            ChatCommand::Users
        } else if line.starts_with(CONNECTION_COMMAND) {
            ChatCommand::Connection
        } else if line.starts_with(QUIT_COMMAND) {
            ChatCommand::Quit
        } else if line.starts_with(HELP_PREFIX) {
            ChatCommand::Help
        } else {
            ChatCommand::Message(line)
        }
    }

    /// Returns true for every variant except `Message`.
    pub fn is_command(&self) -> bool {
        !matches!(self, ChatCommand::Message(_))
    }
}
