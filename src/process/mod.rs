//! External command execution

pub mod shell;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use shell::ShellRunner;

/// Error types for command execution
///
/// The command's own stderr is not part of the error: it has already been
/// streamed to the logger while the command ran.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command \"{command}\" returned error")]
    Failed { command: String, code: Option<i32> },

    #[error("Command \"{command}\" could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// The command line that failed
    pub fn command(&self) -> &str {
        match self {
            CommandError::Failed { command, .. } | CommandError::Spawn { command, .. } => command,
        }
    }
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` through a shell in `dir`, streaming its output
    async fn execute(&self, command: &str, dir: &Path) -> Result<(), CommandError>;
}
