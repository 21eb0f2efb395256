//! Server and hub configuration.

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backlog_size() -> usize {
    20
}

fn default_queue_capacity() -> usize {
    5
}

/// Configuration for the fan-out server and its broadcast hub.
///
/// Every field has a default, so a partial (or absent) config file works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface the WebSocket listener binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the WebSocket listener binds to. 0 picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Messages retained for replay to newly joined subscribers.
    /// 0 disables replay.
    #[serde(default = "default_backlog_size")]
    pub backlog_size: usize,
    /// Per-subscriber delivery queue depth before eviction.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog_size: default_backlog_size(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
