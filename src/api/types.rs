//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::core_state::CoreState;

/// Requests allowed per client per minute
const DEFAULT_PER_MINUTE: u32 = 60;
/// Requests allowed per client per hour
const DEFAULT_PER_HOUR: u32 = 600;
/// Prune idle clients once the table grows past this
const MAX_TRACKED_CLIENTS: usize = 10_000;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self::with_rate_limiter(core, RateLimiter::new())
    }

    pub fn with_rate_limiter(core: Arc<CoreState>, limiter: RateLimiter) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(limiter)),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Report access: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Verified access-token holder, injected into request extensions
/// by the auth middleware.
#[derive(Debug, Clone)]
pub struct ReportAccess {
    pub report_id: Uuid,
    pub email: String,
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_PER_MINUTE, DEFAULT_PER_HOUR)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, client: &str) -> Result<(), u64> {
        let now = Instant::now();
        if self.windows.len() > MAX_TRACKED_CLIENTS {
            self.prune(now);
        }

        let entries = self.windows.entry(client.to_string()).or_default();

        // Clean entries older than 1 hour
        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    fn prune(&mut self, now: Instant) {
        self.windows.retain(|_, entries| {
            entries
                .last()
                .is_some_and(|ts| now.duration_since(*ts) < Duration::from_secs(3600))
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
