//! Per-client fixed-window limiter for contribution creation.
//!
//! State lives in process memory behind a mutex: counters reset on restart
//! and are not shared between instances, so limits hold per instance only.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tracing::{debug, info};

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt from `client` and report whether it is allowed.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut windows = self.lock();

        let Some(entry) = windows.get_mut(client) else {
            windows.insert(
                client.to_string(),
                Window {
                    count: 1,
                    reset_at: now + self.window,
                },
            );
            return true;
        };

        if now > entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return true;
        }

        if entry.count >= self.max_requests {
            debug!(client, count = entry.count, "rate limit exceeded");
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop windows that have already expired.  Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Human readable retry hint, e.g. `"5 minutes"`.
    pub fn retry_hint(&self) -> String {
        let secs = self.window.as_secs();
        match (secs / 60, secs % 60) {
            (1, 0) => "1 minute".to_string(),
            (mins, 0) if mins > 0 => format!("{mins} minutes"),
            _ => format!("{secs} seconds"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        // Counters stay usable even if a holder panicked.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background task that keeps the window map from growing without bound.
pub async fn run_sweeper(limiter: Arc<RateLimiter>, interval: Duration) {
    info!("Rate-limit sweeper running every {}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let removed = limiter.purge_expired(Instant::now());
        if removed > 0 {
            debug!(
                removed,
                remaining = limiter.tracked_clients(),
                "purged expired rate-limit windows"
            );
        }
    }
}

/// Identify the caller: first `X-Forwarded-For` entry, else the peer IP.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
