//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the admin client.
///
/// Only [`CliError::NotReady`] is ever retried, and only by the readiness
/// waits in [`crate::topology`]. Everything else aborts the run.
#[derive(Debug, Error)]
pub enum CliError {
    /// A cluster or replica id was not a decimal integer.
    #[error("can't convert to integer {0:?}")]
    Conversion(String),

    /// The bridge config file could not be read.
    #[error("config file path error [{}]: {source}", path.display())]
    ConfigAccess {
        /// Config path that was tried.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The bridge config file was readable but invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required input file could not be read.
    #[error("can't read file {}: {source}", path.display())]
    FileAccess {
        /// File that was tried.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A parameter the command needs was not given.
    #[error("missing required parameter --{0}")]
    MissingParameter(&'static str),

    /// A parameter was given but is not acceptable.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// No command was given.
    #[error("cannot find command, --cmd should be specified")]
    MissingCommand,

    /// The bridge could not be reached or the session went away.
    #[error("connection error: {0}")]
    Connection(String),

    /// The bridge sent something the client does not understand.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The bridge answered a request with an error.
    #[error("bridge error {code}: {message}")]
    Remote {
        /// Bridge error code.
        code: u32,
        /// Bridge error message.
        message: String,
    },

    /// A request to the bridge did not complete in time.
    #[error("request timed out: {0}")]
    RequestTimeout(String),

    /// The cluster has not reached the awaited state yet.
    #[error("{0} is not ready")]
    NotReady(String),

    /// A readiness wait passed its deadline.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// A readiness wait was cancelled.
    #[error("cancelled while waiting for {0}")]
    Cancelled(String),

    /// The result could not be pretty-printed.
    #[error("fail to parse status data: {0}")]
    Presentation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A command failed after it was dispatched.
    #[error("can't execute command {command}, {source}")]
    Command {
        /// Command name as given on the command line.
        command: String,
        /// What went wrong.
        source: Box<CliError>,
    },
}

impl CliError {
    /// Attach the name of the command that failed.
    #[must_use]
    pub fn in_command(self, command: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            source: Box::new(self),
        }
    }
}

impl From<brz_proto::ProtoError> for CliError {
    fn from(err: brz_proto::ProtoError) -> Self {
        match err {
            brz_proto::ProtoError::InvalidIndexingType(_) => Self::Validation(err.to_string()),
            other => Self::Protocol(other.to_string()),
        }
    }
}
