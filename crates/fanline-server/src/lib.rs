//! Broadcast hub and WebSocket fan-out server.
//!
//! One [`BroadcastHub`] receives relayed lines (it implements
//! `fanline_core::MessageSink`), keeps a bounded backlog for replay, and
//! fans each line out to per-subscriber bounded queues. The Axum server in
//! [`server`] upgrades `GET /ws` connections and attaches each one to the
//! hub; `GET /health` reports uptime and subscriber count.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod hub;
pub mod server;
pub mod shutdown;
pub mod subscriber;

pub use config::ServerConfig;
pub use health::HealthResponse;
pub use hub::{BroadcastHub, SubscriberId, Subscription};
pub use server::{AppState, ServerHandle, build_router, serve};
pub use shutdown::ShutdownCoordinator;
pub use subscriber::SubscriberSink;
