//! Health endpoint payload.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Currently connected subscribers.
    pub subscribers: usize,
}

/// Snapshot the server's health.
pub fn health_check(start_time: Instant, subscribers: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        uptime_secs: start_time.elapsed().as_secs(),
        subscribers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_ok_and_subscriber_count() {
        let health = health_check(Instant::now(), 3);
        assert_eq!(health.status, "ok");
        assert_eq!(health.subscribers, 3);
        assert_eq!(health.uptime_secs, 0);
    }

    #[test]
    fn uptime_counts_from_start_time() {
        let started = Instant::now() - Duration::from_secs(90);
        let health = health_check(started, 0);
        assert!(health.uptime_secs >= 90);
    }

    #[test]
    fn serializes_expected_fields() {
        let health = health_check(Instant::now(), 1);
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["subscribers"], 1);
        assert!(json["uptime_secs"].is_number());
    }
}
