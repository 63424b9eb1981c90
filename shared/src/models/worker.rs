//! Worker registry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Persisted worker status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Online,
    Offline,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Online => "online",
            WorkerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of the `GET /workers/status` roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatusResponse {
    pub worker_name: String,
    pub status: WorkerStatus,
    pub orders_processed: i64,
    pub last_seen: DateTime<Utc>,
}

/// Liveness override for the roster: a worker whose `last_seen` is older
/// than twice the heartbeat interval is reported offline regardless of
/// its persisted status column.
pub fn effective_worker_status(
    stored: WorkerStatus,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    heartbeat_interval: Duration,
) -> WorkerStatus {
    if stored == WorkerStatus::Online {
        let threshold = chrono::Duration::from_std(heartbeat_interval * 2)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        if now - last_seen > threshold {
            return WorkerStatus::Offline;
        }
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_online_worker_reported_offline() {
        let now = Utc::now();
        let heartbeat = Duration::from_secs(30);
        let stale = now - chrono::Duration::seconds(61);
        assert_eq!(
            effective_worker_status(WorkerStatus::Online, stale, now, heartbeat),
            WorkerStatus::Offline
        );
    }

    #[test]
    fn test_fresh_online_worker_stays_online() {
        let now = Utc::now();
        let heartbeat = Duration::from_secs(30);
        let fresh = now - chrono::Duration::seconds(59);
        assert_eq!(
            effective_worker_status(WorkerStatus::Online, fresh, now, heartbeat),
            WorkerStatus::Online
        );
    }

    #[test]
    fn test_offline_worker_never_promoted() {
        let now = Utc::now();
        let heartbeat = Duration::from_secs(30);
        assert_eq!(
            effective_worker_status(WorkerStatus::Offline, now, now, heartbeat),
            WorkerStatus::Offline
        );
    }
}
