// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window request throttle for the contact endpoint.
//!
//! Tracks per-client admission counts in fixed time windows
//! (10 requests per 60s by default). The client key is derived from the
//! forwarded-for header by the handler; the throttle itself only sees an
//! opaque key.

use crate::config::ThrottleConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of an admission check.
#[derive(Debug, Clone)]
pub enum ThrottleDecision {
    /// Request is admitted
    Allowed {
        /// Remaining admissions in the current window
        remaining: u32,
        /// Time until the window resets
        reset_in: Duration,
    },
    /// Request exceeds the window capacity
    Denied {
        /// Time until the window resets
        retry_after: Duration,
    },
}

/// Per-key window state.
#[derive(Debug)]
struct WindowRecord {
    /// Requests seen in the current window (denied ones included)
    count: u32,
    /// When the current window ends
    reset_at: Instant,
}

/// Thread-safe fixed-window throttle.
///
/// Constructed once at startup and owned by the application state; the
/// map supports concurrent admission checks without lost increments by
/// performing the whole read-modify-write under one write lock.
pub struct RequestThrottle {
    config: ThrottleConfig,
    records: RwLock<HashMap<String, WindowRecord>>,
}

impl RequestThrottle {
    /// Create a new throttle with the given configuration.
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Check admission for a client key at the given instant.
    ///
    /// A fresh window is opened on the first request from a key or when
    /// the previous window has elapsed. The record is overwritten on
    /// rollover, never merged across windows.
    pub async fn admit(&self, key: &str, now: Instant) -> ThrottleDecision {
        let window = self.config.window_duration();
        let mut records = self.records.write().await;

        let record = records.entry(key.to_string()).or_insert_with(|| WindowRecord {
            count: 0,
            reset_at: now + window,
        });
        if now >= record.reset_at {
            *record = WindowRecord {
                count: 0,
                reset_at: now + window,
            };
        }

        record.count += 1;
        if record.count > self.config.max_requests {
            let retry_after = record.reset_at.duration_since(now);
            debug!(key, count = record.count, ?retry_after, "Request denied");
            ThrottleDecision::Denied { retry_after }
        } else {
            ThrottleDecision::Allowed {
                remaining: self.config.max_requests - record.count,
                reset_in: record.reset_at.duration_since(now),
            }
        }
    }

    /// Drop records whose window has elapsed (called periodically).
    ///
    /// Without this the map grows one entry per distinct client key for
    /// the life of the process.
    pub async fn sweep(&self, now: Instant) {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| now < record.reset_at);
        let dropped = before - records.len();
        if dropped > 0 {
            debug!(dropped, retained = records.len(), "Swept stale throttle records");
        }
    }

    /// Number of tracked client keys.
    pub async fn tracked_keys(&self) -> usize {
        self.records.read().await.len()
    }
}
