//! Command-line interface. Flags override file and environment settings.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;

/// Relay a line-oriented remote text stream to WebSocket subscribers.
#[derive(Parser, Debug)]
#[command(name = "fanline", version, about)]
pub struct Cli {
    /// Remote host to relay from (`host:port`).
    #[arg(long)]
    pub remote: Option<String>,

    /// Identity announced to the remote host on connect.
    #[arg(long)]
    pub identity: Option<String>,

    /// Interface to bind the WebSocket listener to.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the WebSocket listener to (0 for auto-assign).
    #[arg(long)]
    pub port: Option<u16>,

    /// Messages retained for replay to new subscribers (0 disables).
    #[arg(long)]
    pub backlog: Option<usize>,

    /// Per-subscriber queue depth before a slow subscriber is dropped.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Path to a JSON settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Overlay the given flags onto loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(remote) = &self.remote {
            settings.remote.addr.clone_from(remote);
        }
        if let Some(identity) = &self.identity {
            settings.remote.identity = Some(identity.clone());
        }
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(backlog) = self.backlog {
            settings.server.backlog_size = backlog;
        }
        if let Some(queue) = self.queue_capacity {
            settings.server.queue_capacity = queue;
        }
    }
}
