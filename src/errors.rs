// src/errors.rs

//! Crate-wide error type and result alias.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// Invalid executor or interaction configuration (environment map,
    /// empty command, bad regex, malformed config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The OS refused to start the process.
    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A worker task failed, panicked or was cancelled. `context` names the
    /// command (or polling task) that was running.
    #[error("{context}: {source}")]
    Execution {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A synchronous execution completed with a failing exit code.
    #[error("Invocation of `{command}` failed with exit code {exit_code}")]
    Failed { command: String, exit_code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcessError {
    /// Exit code carried by a [`ProcessError::Failed`] error.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// True for both execution failure kinds: worker failures and failing
    /// exit codes.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            ProcessError::Execution { .. } | ProcessError::Failed { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcessError>;
