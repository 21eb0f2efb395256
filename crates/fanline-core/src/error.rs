//! Error taxonomy for the relay and hub.
//!
//! Transport failures are fatal to the relay instance that hit them and
//! propagate to the orchestrator. Everything subscriber-local (a full
//! delivery queue, a dead downstream socket) is handled where it happens
//! and never surfaces here.

use std::io;

/// Errors produced by the line relay and the remote transport.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The remote stream failed to open, or a read/write failed mid-session.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// `send` was invoked before the relay was started.
    #[error("relay not initialized")]
    NotInitialized,

    /// `send` was invoked after the write loop ended.
    #[error("relay closed")]
    Closed,
}

impl RelayError {
    /// Whether this error should tear down the whole relay process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Short classification string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::NotInitialized => "not_initialized",
            Self::Closed => "closed",
        }
    }
}
