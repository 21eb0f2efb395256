//! # fanline-relay
//!
//! The line relay: wraps one duplex byte stream, splits inbound bytes into
//! newline-delimited messages delivered to a [`fanline_core::MessageSink`],
//! and writes outbound messages queued via [`LineRelay::send`] back to the
//! stream. Both directions terminate together.
//!
//! The [`transport`] module holds the seam to the remote endpoint: the
//! relay itself only ever sees opaque read/write halves.

#![deny(unsafe_code)]

pub mod relay;
pub mod transport;

pub use relay::LineRelay;
pub use transport::{RemoteReader, RemoteTransport, RemoteWriter, TcpTransport};
