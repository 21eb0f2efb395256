//! # fanline-core
//!
//! Primitives shared by the line relay and the broadcast hub:
//!
//! - [`RelayError`] — the error taxonomy for transport and lifecycle failures
//! - [`MessageSink`] — the capability handed to the relay's read loop
//! - [`Backlog`] — bounded recent-message history replayed to new subscribers
//! - [`CloseState`] — fire-once Open → Closing → Closed state machine

#![deny(unsafe_code)]

pub mod backlog;
pub mod close;
pub mod error;
pub mod sink;

pub use backlog::Backlog;
pub use close::CloseState;
pub use error::RelayError;
pub use sink::MessageSink;
