//! Per-client fixed-window rate limiting.
//!
//! Counts requests per source address over a fixed window (default 100 per
//! 15 minutes). The window semantics are deliberate: the Nth+1 request
//! inside a window is rejected, the first request after the window rolls
//! over is admitted again.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::error::ApiError;

/// Evict expired windows once the map grows past this many clients.
const EVICTION_THRESHOLD: usize = 1024;

struct Window {
    started: Instant,
    count: u32,
}

pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request from `client` and admit or reject it.
    pub fn check(&self, client: IpAddr) -> Result<(), ApiError> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), ApiError> {
        let mut clients = self.clients.lock();

        if clients.len() > EVICTION_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count += 1;

        if entry.count > self.max_requests {
            Err(ApiError::too_many_requests(
                "Too many requests, please try again later",
            ))
        } else {
            Ok(())
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}
