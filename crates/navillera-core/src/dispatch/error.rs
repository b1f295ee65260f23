//! Errors that abort a dispatch run before or while spawning the tool.
//!
//! A batch that runs and exits non-zero is not an error here; it is recorded
//! as a failed [`InvocationResult`](super::InvocationResult) in the summary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Invalid option or input, detected before any process is spawned.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tool could not be started. Aborts the whole run.
    #[error(
        "could not start {}: {source} (run `navillera fetch` to install or update the tool)",
        program.display()
    )]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while preparing the run or driving a process.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        DispatchError::Configuration(msg.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DispatchError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors raised by pre-run validation.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DispatchError::Configuration(_))
    }
}
