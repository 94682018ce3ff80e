//! # Request Status Log
//!
//! A bounded, time-expiring record of recent `/api/` responses shown on the
//! admin status page. It lives in `AppState` and is never read by booking logic.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub method: String,
    pub endpoint: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StatusLog {
    entries: Arc<Mutex<VecDeque<StatusEntry>>>,
    capacity: usize,
    ttl: Duration,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl StatusLog {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StatusEntry>> {
        // A panic mid-push cannot leave the queue inconsistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prune(&self, entries: &mut VecDeque<StatusEntry>, now: DateTime<Utc>) {
        let cutoff = now - self.ttl;
        while entries.front().map_or(false, |e| e.timestamp <= cutoff) {
            entries.pop_front();
        }
    }

    pub fn record(&self, entry: StatusEntry) {
        let now = entry.timestamp;
        let mut entries = self.lock();
        self.prune(&mut entries, now);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Live entries as of `now`, newest first
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Vec<StatusEntry> {
        let mut entries = self.lock();
        self.prune(&mut entries, now);
        entries.iter().rev().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<StatusEntry> {
        self.snapshot_at(Utc::now())
    }
}

/// Middleware recording the outcome of every `/api/` request
pub async fn record_status(State(log): State<StatusLog>, request: Request, next: Next) -> Response {
    let endpoint = request.uri().path().to_string();
    let method = request.method().to_string();
    let response = next.run(request).await;

    if endpoint.starts_with("/api/") {
        log.record(StatusEntry {
            method,
            endpoint,
            status: response.status().as_u16(),
            timestamp: Utc::now(),
        });
    }
    response
}
