// src/core/supervisor/launcher.rs

//! Starting a chat-server child process and waiting for it to exit.

use crate::core::ChatError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` when the process was terminated by a signal.
    code: Option<i32>,
}

impl ChildExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn signaled() -> Self {
        Self { code: None }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "termination by signal"),
        }
    }
}

/// Starts a chat server for a port and resolves when it exits.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Verifies up front that servers can be launched at all.
    fn check(&self) -> Result<(), ChatError> {
        Ok(())
    }

    /// Launches a chat server for `port` and waits for it to exit.
    async fn run_to_exit(&self, port: u16) -> Result<ChildExit, ChatError>;
}

/// Launches `<program> servidor <port>` as a real child process.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
    config_file: Option<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_file: None,
        }
    }

    /// Forwards `--config <path>` to every child.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// The argument list for a child serving `port`.
    pub fn args(&self, port: u16) -> Vec<String> {
        let mut args = vec!["servidor".to_string(), port.to_string()];
        if let Some(path) = &self.config_file {
            args.push("--config".to_string());
            args.push(path.clone());
        }
        args
    }

    fn launch_error(&self, reason: impl fmt::Display) -> ChatError {
        ChatError::Launch {
            program: self.program.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ProcessLauncher for CommandLauncher {
    fn check(&self) -> Result<(), ChatError> {
        if self.program.is_file() {
            Ok(())
        } else {
            Err(self.launch_error("the executable does not exist or is not accessible"))
        }
    }

    async fn run_to_exit(&self, port: u16) -> Result<ChildExit, ChatError> {
        let mut child = Command::new(&self.program)
            .args(self.args(port))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.launch_error(e))?;
        let status = child.wait().await?;
        Ok(ChildExit::from(status))
    }
}
