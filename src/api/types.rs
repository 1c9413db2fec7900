//! Shared types for the HTTP API layer.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    /// Peers whose `X-Forwarded-For` names the real client.
    pub trusted_proxies: Arc<[IpAddr]>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }
}

/// Raw bearer token of the current request, injected next to the
/// `Identity` by the session middleware so sign-out can revoke it.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Idle clients are dropped at most this often.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Sliding-window limiter on the credential endpoints, keyed by client
/// address. Each client keeps its hits from the last hour, oldest first.
pub struct RateLimiter {
    hits: HashMap<String, VecDeque<Instant>>,
    per_minute: usize,
    per_hour: usize,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(20, 200)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            hits: HashMap::new(),
            per_minute: per_minute as usize,
            per_hour: per_hour as usize,
            last_sweep: Instant::now(),
        }
    }

    /// Record a hit for `client`, or return the seconds to wait.
    pub fn check(&mut self, client: &str) -> Result<(), u64> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&mut self, client: &str, now: Instant) -> Result<(), u64> {
        if now.saturating_duration_since(self.last_sweep) >= SWEEP_INTERVAL {
            self.sweep(now);
        }

        let window = self.hits.entry(client.to_string()).or_default();
        expire(window, now);

        if window.len() >= self.per_hour {
            return Err(retry_after(window, now, HOUR, self.per_hour));
        }
        let recent = window
            .iter()
            .rev()
            .take_while(|hit| now.saturating_duration_since(**hit) < MINUTE)
            .count();
        if recent >= self.per_minute {
            return Err(retry_after(window, now, MINUTE, self.per_minute));
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop every client whose window has emptied.
    fn sweep(&mut self, now: Instant) {
        self.hits.retain(|_, window| {
            expire(window, now);
            !window.is_empty()
        });
        self.last_sweep = now;
        tracing::debug!(clients = self.hits.len(), "Rate limiter swept");
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn expire(window: &mut VecDeque<Instant>, now: Instant) {
    while window
        .front()
        .is_some_and(|hit| now.saturating_duration_since(*hit) >= HOUR)
    {
        window.pop_front();
    }
}

/// Seconds until the oldest hit counted against `limit` leaves `span`.
fn retry_after(window: &VecDeque<Instant>, now: Instant, span: Duration, limit: usize) -> u64 {
    let oldest = window.len().saturating_sub(limit);
    window
        .get(oldest)
        .map(|hit| span.saturating_sub(now.saturating_duration_since(*hit)).as_secs().max(1))
        .unwrap_or(span.as_secs())
}
