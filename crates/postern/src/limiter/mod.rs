//! Per-identity sliding-window admission control.
//!
//! Each identity (client address) owns the timestamps of its admissions
//! within the trailing window. Entries are pruned lazily on every check;
//! nothing runs in the background unless an idle sweep is configured.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::RateLimitConfig;

type WindowTable = HashMap<String, VecDeque<Instant>>;

/// Sliding-window rate limiter shared by every request worker.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    windows: Mutex<WindowTable>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: config.window(),
            max_requests: config.max_requests,
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Admit or deny one request from `identity`.
    ///
    /// Prune, check and append happen under a single lock acquisition.
    /// A denied request records nothing.
    pub fn admit(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut table = self.table();
        let stamps = table.entry(identity.to_string()).or_default();

        while let Some(oldest) = stamps.front() {
            if now.duration_since(*oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.max_requests {
            debug!(identity = %identity, in_window = stamps.len(), "Rate window full");
            return false;
        }

        stamps.push_back(now);
        true
    }

    /// Drop identities whose newest admission has left the window.
    ///
    /// Returns how many identities were evicted.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let mut table = self.table();
        let before = table.len();

        table.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|newest| now.duration_since(*newest) < self.window)
        });

        before - table.len()
    }

    /// Number of identities currently held in the table
    pub fn tracked_identities(&self) -> usize {
        self.table().len()
    }

    // The table stays consistent even if a holder panicked: every mutation
    // is a single push/pop/retain.
    fn table(&self) -> MutexGuard<'_, WindowTable> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
