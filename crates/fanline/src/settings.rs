//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `FANLINE_*` environment variable overrides (highest priority
//!    before CLI flags)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fanline_server::ServerConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

fn default_remote_addr() -> String {
    "127.0.0.1:2022".to_string()
}

/// Upstream connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// `host:port` of the line-oriented remote host.
    #[serde(default = "default_remote_addr")]
    pub addr: String,
    /// Identity announced as the first outbound line on connect.
    #[serde(default)]
    pub identity: Option<String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            addr: default_remote_addr(),
            identity: None,
        }
    }
}

/// Complete process settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Fan-out server and hub settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote host settings.
    #[serde(default)]
    pub remote: RemoteSettings,
}

/// Resolve the default settings path (`~/.fanline/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fanline").join("settings.json")
}

/// Load settings from `path` with env var overrides applied.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let user: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in settings file {}", path.display()))?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per-key; arrays and primitives are replaced entirely;
/// nulls in `source` are skipped so they cannot erase defaults.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `FANLINE_*` environment variable overrides.
///
/// Invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_string("FANLINE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("FANLINE_PORT") {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("FANLINE_BACKLOG", 10_000) {
        settings.server.backlog_size = v;
    }
    if let Some(v) = read_env_usize("FANLINE_QUEUE_CAPACITY", 10_000) {
        settings.server.queue_capacity = v;
    }
    if let Some(v) = read_env_string("FANLINE_REMOTE_ADDR") {
        settings.remote.addr = v;
    }
    if let Some(v) = read_env_string("FANLINE_IDENTITY") {
        settings.remote.identity = Some(v);
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str) -> Option<u16> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn read_env_usize(name: &str, max: usize) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v <= max)
}
